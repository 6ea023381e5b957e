use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::domain::{DataAccessError, Storage};

impl From<serde_json::Error> for DataAccessError {
    fn from(value: serde_json::Error) -> Self {
        DataAccessError::SerializationError(Box::new(value))
    }
}

/// キーの値をJSONとして読み込む。未保存なら `None`
pub fn load_snapshot<T, S>(storage: &S, key: &str) -> Result<Option<T>, DataAccessError>
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    match storage.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// 値をJSONにしてキーへ丸ごと上書きする
pub fn save_snapshot<T, S>(storage: &mut S, key: &str, value: &T) -> Result<(), DataAccessError>
where
    T: Serialize + ?Sized,
    S: Storage + ?Sized,
{
    let json = serde_json::to_string(value)?;
    debug!(key, bytes = json.len(), "スナップショットを保存します");
    storage.set(key, json)
}

/// ディレクトリ内に `<key>.json` としてキーごとに保存するストレージ
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| DataAccessError::WriteError(Box::new(e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DataAccessError> {
        match fs::read_to_string(self.path(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DataAccessError::ReadError(Box::new(e))),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), DataAccessError> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| DataAccessError::WriteError(Box::new(e)))
    }
}

/// メモリ上のストレージ。書き込みの履歴を残す
///
/// 履歴は上限なく増えるため、テストやデモ用に限る
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    writes: Vec<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込まれたキー（書き込み順）
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DataAccessError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), DataAccessError> {
        self.values.insert(key.to_owned(), value);
        self.writes.push(key.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::application::demo;
    use crate::domain::core::{CurrentUser, Reservation};

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kontor-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_memory_storage_records_writes() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("currentUser").unwrap(), None);
        save_snapshot(&mut storage, "currentUser", &CurrentUser::default()).unwrap();
        assert_eq!(storage.writes(), ["currentUser".to_owned()]);
        assert_eq!(
            load_snapshot::<CurrentUser, _>(&storage, "currentUser").unwrap(),
            Some(CurrentUser::default())
        );
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = temp_dir("round-trip");
        let mut storage = JsonFileStorage::open(&dir).unwrap();
        assert_eq!(storage.get("carReservations").unwrap(), None);

        save_snapshot(&mut storage, "carReservations", demo::reservations().as_slice()).unwrap();
        let loaded = load_snapshot::<Vec<Reservation>, _>(&storage, "carReservations").unwrap();
        assert_eq!(loaded, Some(demo::reservations()));
        assert!(dir.join("carReservations.json").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_snapshot_is_serialization_error() {
        let mut storage = MemoryStorage::new();
        storage.set("carReservations", "{not json".to_owned()).unwrap();
        assert!(matches!(
            load_snapshot::<Vec<Reservation>, _>(&storage, "carReservations"),
            Err(DataAccessError::SerializationError(_))
        ));
    }
}
