//! Fixture models for unit tests
//!
//! - `office` has many `employee`; an employee belongs to a `department` and
//!   optionally to a `manager` (another employee)
//! - `car` belongs to many `user` through the `car_user` junction model, whose
//!   relations declare non-default key names
//! - `base` belongs to an `audit`, which belongs to a `user`
//! - `person` is the union of employees and users

use crate::behavior::{Behaviors, Binary, BoolCast, Sensitive, VirtualColumns};
use crate::error::Result;
use crate::model::{column_list, Accessor, ColumnExpr, Columns, Model};
use crate::query::{JoinKind, SelectColumn, UnionMember, UnionModel};
use crate::record::Record;
use crate::relation::{Identity, Relations};
use crate::value;
use indexmap::IndexMap;
use sea_query::{Expr, Value};

pub struct Office;

impl Model for Office {
    fn table_name(&self) -> &str {
        "office"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["city", "country"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.has_many("employee", || Employee)?;
        Ok(())
    }
}

pub struct Employee;

fn display_name(record: &Record) -> Option<Value> {
    let id = record.get_opt("id").and_then(value::as_i64)?;
    match record.get_opt("name")? {
        Value::String(Some(name)) => Some(Value::from(format!("#{} {}", id, name))),
        _ => None,
    }
}

impl Model for Employee {
    fn table_name(&self) -> &str {
        "employee"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name", "office_id", "department_id", "manager_id"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.belongs_to("department", || Department)?;
        relations
            .belongs_to("manager", || Employee)?
            .set_candidate_key("manager_id")
            .set_join_type(JoinKind::Left);
        Ok(())
    }

    fn create_behaviors(&self, behaviors: &mut Behaviors) {
        behaviors.add(VirtualColumns::new().map("department_name", "department.name"));
    }

    fn accessors(&self) -> Vec<(&'static str, Accessor)> {
        vec![("display_name", display_name as Accessor)]
    }
}

pub struct Department;

impl Model for Department {
    fn table_name(&self) -> &str {
        "department"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        let mut columns = column_list(["name"]);
        columns.insert("label".into(), ColumnExpr::raw("UPPER({table}.name)"));
        columns
    }
}

pub struct Car;

impl Model for Car {
    fn table_name(&self) -> &str {
        "car"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations
            .belongs_to_many("user", || User, "car_user")?
            .set_through(|| CarUser);
        Ok(())
    }
}

pub struct CarUser;

impl Model for CarUser {
    fn table_name(&self) -> &str {
        "car_user"
    }

    fn key_name(&self) -> Identity {
        ["car_custom_foreign_key", "car_user_user_candidate_key"].into()
    }

    fn columns(&self) -> Columns {
        Columns::new()
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations
            .belongs_to("car", || Car)?
            .set_candidate_key("car_custom_foreign_key");
        relations
            .belongs_to("user", || User)?
            .set_candidate_key("car_user_user_candidate_key")
            .set_foreign_key("user_custom_foreign_key");
        Ok(())
    }
}

pub struct User;

impl Model for User {
    fn table_name(&self) -> &str {
        "user"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name", "active", "avatar", "password", "user_custom_foreign_key"])
    }

    fn create_behaviors(&self, behaviors: &mut Behaviors) {
        behaviors
            .add(BoolCast::new(["active"]))
            .add(Binary::new(["avatar"]))
            .add(Sensitive::new(["password"]));
    }
}

pub struct Base;

impl Model for Base {
    fn table_name(&self) -> &str {
        "base"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["title", "audit_id"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.belongs_to("audit", || Audit)?;
        Ok(())
    }
}

pub struct Audit;

impl Model for Audit {
    fn table_name(&self) -> &str {
        "audit"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["action", "user_id"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.belongs_to("user", || User)?;
        Ok(())
    }

    fn defaults(&self) -> IndexMap<String, Value> {
        IndexMap::from([("action".to_string(), Value::from("unknown"))])
    }
}

/// Model with a key and nothing else
pub struct Keyless;

impl Model for Keyless {
    fn table_name(&self) -> &str {
        "keyless"
    }

    fn key_name(&self) -> Identity {
        "code".into()
    }

    fn columns(&self) -> Columns {
        Columns::new()
    }
}

/// Virtual columns pointing at each other
pub struct Looping;

impl Model for Looping {
    fn table_name(&self) -> &str {
        "looping"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name"])
    }

    fn create_behaviors(&self, behaviors: &mut Behaviors) {
        behaviors.add(VirtualColumns::new().map("alpha", "beta").map("beta", "alpha"));
    }
}

pub struct Person;

impl Model for Person {
    fn table_name(&self) -> &str {
        "person"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name", "kind", "office_id"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.belongs_to("office", || Office)?;
        Ok(())
    }
}

impl UnionModel for Person {
    fn unions(&self) -> Vec<UnionMember> {
        vec![
            UnionMember::new(|| Employee)
                .column("id", "id")
                .column("name", "name")
                .column("kind", SelectColumn::expression("kind", Expr::val("employee")))
                .column("office_id", "office_id"),
            UnionMember::new(|| User)
                .column("id", "id")
                .column("name", "name")
                .column("kind", SelectColumn::expression("kind", Expr::val("user"))),
        ]
    }
}
