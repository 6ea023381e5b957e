use serde::{Deserialize, Serialize};

use crate::domain::{prefixed_id, Entity};

prefixed_id!(
    /// 社員ID
    EmployeeId,
    "emp"
);

/// 役割
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 営業担当
    Sales,
    /// マネージャー
    Manager,
}

/// 社員
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    role: Role,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    const ENTITY_NAME: &'static str = "employee";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 操作中のユーザー
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub role: Role,
    pub name: String,
}

impl CurrentUser {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// 指定した役割を持つ最初の社員に切り替える
    pub fn switch_to(employees: &[Employee], role: Role) -> Option<Self> {
        employees
            .iter()
            .find(|e| e.role == role)
            .map(|e| CurrentUser {
                role,
                name: e.name.clone(),
            })
    }
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self {
            role: Role::Manager,
            name: "Julia Becker".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees() -> Vec<Employee> {
        vec![
            Employee::new(EmployeeId::from(1), "Anna Schmidt", Role::Sales),
            Employee::new(EmployeeId::from(2), "Michael Weber", Role::Sales),
            Employee::new(EmployeeId::from(5), "Julia Becker", Role::Manager),
        ]
    }

    #[test]
    fn test_switch_to_first_employee_with_role() {
        let user = CurrentUser::switch_to(&employees(), Role::Sales).unwrap();
        assert_eq!(user.name, "Anna Schmidt");
        assert!(!user.is_manager());

        let user = CurrentUser::switch_to(&employees(), Role::Manager).unwrap();
        assert_eq!(user, CurrentUser::default());
    }

    #[test]
    fn test_switch_to_missing_role() {
        assert_eq!(CurrentUser::switch_to(&employees()[..2], Role::Manager), None);
    }

    #[test]
    fn test_current_user_serde() {
        let json = serde_json::to_string(&CurrentUser::default()).unwrap();
        assert_eq!(json, r#"{"role":"manager","name":"Julia Becker"}"#);
    }
}
