//! Fixture models and an in-memory SQLite database holding their rows
//!
//! Offices:
//! - 1 Duckburg: Donald (Accounting), Mickey (Kitchen)
//! - 2 Calisota: Goofy (Kitchen)
//! - 3 Mouseton: no employees

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sea_query::{Expr, ExprTrait, Func, Value};
use undertow::behavior::{Behavior, Behaviors, Binary, BoolCast, RewriteBehavior, RewriteContext, Sensitive};
use undertow::filter::{Condition, FilterValue, Operator};
use undertow::Filter;
use undertow::query::{SelectColumn, UnionMember, UnionModel};
use undertow::{column_list, Columns, Dialect, Identity, Model, Query, QueryConfig, Relations, Result, Row};

pub struct Office;

impl Model for Office {
    fn table_name(&self) -> &str {
        "office"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["city"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.has_many("employee", || Employee)?;
        Ok(())
    }
}

pub struct Employee;

impl Model for Employee {
    fn table_name(&self) -> &str {
        "employee"
    }

    fn key_name(&self) -> Identity {
        "id".into()
    }

    fn columns(&self) -> Columns {
        column_list(["name", "office_id", "department_id"])
    }

    fn create_relations(&self, relations: &mut Relations) -> Result<()> {
        relations.belongs_to("department", || Department)?;
        relations.belongs_to("office", || Office)?;
        Ok(())
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
        column_list(["name"])
    }

    fn create_behaviors(&self, behaviors: &mut Behaviors) {
        behaviors.add(CaseInsensitive::new(["name"]));
    }
}

/// `equal` on its columns compares lowercased text
pub struct CaseInsensitive {
    columns: Vec<String>,
}

impl CaseInsensitive {
    pub fn new<const N: usize>(columns: [&str; N]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl RewriteBehavior for CaseInsensitive {
    fn rewrite_condition(&self, condition: &Condition, context: &RewriteContext<'_>) -> Result<Option<Filter>> {
        if condition.operator != Operator::Equal || !self.columns.contains(&condition.column) {
            return Ok(None);
        }
        let FilterValue::Scalar(Value::String(Some(text))) = &condition.value else {
            return Ok(None);
        };
        let lowered = Expr::from(Func::lower(context.column(&condition.column)));
        Ok(Some(Filter::Expression(lowered.eq(text.to_lowercase()))))
    }
}

impl Behavior for CaseInsensitive {
    fn name(&self) -> &'static str {
        "case_insensitive"
    }

    fn as_rewrite(&self) -> Option<&dyn RewriteBehavior> {
        Some(self)
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
                .column("kind", SelectColumn::expression("kind", sea_query::Expr::val("employee")))
                .column("office_id", "office_id"),
            UnionMember::new(|| User)
                .column("id", "id")
                .column("name", "name")
                .column("kind", SelectColumn::expression("kind", sea_query::Expr::val("user"))),
        ]
    }
}

const SCHEMA: &str = r#"
CREATE TABLE office (id INTEGER PRIMARY KEY, city TEXT);
CREATE TABLE department (id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE employee (id INTEGER PRIMARY KEY, name TEXT, office_id INTEGER, department_id INTEGER);
CREATE TABLE car (id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE "user" (
    id INTEGER PRIMARY KEY,
    name TEXT,
    active TEXT,
    avatar BLOB,
    password TEXT,
    user_custom_foreign_key INTEGER
);
CREATE TABLE car_user (car_custom_foreign_key INTEGER, car_user_user_candidate_key INTEGER);
CREATE TABLE audit (id INTEGER PRIMARY KEY, action TEXT, user_id INTEGER);
CREATE TABLE base (id INTEGER PRIMARY KEY, title TEXT, audit_id INTEGER);

INSERT INTO office (id, city) VALUES (1, 'Duckburg'), (2, 'Calisota'), (3, 'Mouseton');
INSERT INTO department (id, name) VALUES (1, 'Accounting'), (2, 'Kitchen');
INSERT INTO employee (id, name, office_id, department_id) VALUES
    (1, 'Donald', 1, 1),
    (2, 'Mickey', 1, 2),
    (3, 'Goofy', 2, 2);
INSERT INTO car (id, name) VALUES (1, 'Model T'), (2, 'Beetle'), (3, 'Mini');
INSERT INTO "user" (id, name, active, password, user_custom_foreign_key) VALUES
    (1, 'Scrooge', 'y', 'money', 100),
    (2, 'Gyro', 'n', 'gears', 200);
INSERT INTO car_user (car_custom_foreign_key, car_user_user_candidate_key) VALUES
    (1, 100),
    (2, 100),
    (2, 200);
INSERT INTO audit (id, action, user_id) VALUES (10, 'create', 2);
INSERT INTO base (id, title, audit_id) VALUES (1, 'Report', 10);
"#;

pub fn database() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

pub fn sqlite() -> QueryConfig {
    QueryConfig {
        dialect: Dialect::Sqlite,
        ..QueryConfig::default()
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::String(None),
        ValueRef::Integer(i) => Value::BigInt(Some(i)),
        ValueRef::Real(f) => Value::Double(Some(f)),
        ValueRef::Text(text) => Value::String(Some(String::from_utf8_lossy(text).into_owned())),
        ValueRef::Blob(bytes) => Value::Bytes(Some(bytes.to_vec())),
    }
}

/// Run an inlined SQL statement and collect its rows by column name
pub fn fetch_sql(conn: &Connection, sql: &str) -> Vec<Row> {
    let mut statement = conn.prepare(sql).unwrap_or_else(|e| panic!("{e}: {sql}"));
    let names: Vec<String> = statement.column_names().into_iter().map(str::to_owned).collect();
    statement
        .query_map([], |row| {
            let mut values = Row::new();
            for (index, name) in names.iter().enumerate() {
                values.insert(name.clone(), to_value(row.get_ref(index)?));
            }
            Ok(values)
        })
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

/// Assemble `query` for SQLite and run it
pub fn fetch(conn: &Connection, query: &mut Query) -> Vec<Row> {
    let sql = query.to_sql().unwrap();
    fetch_sql(conn, &sql)
}

/// Values of one column, in row order
pub fn column(rows: &[Row], name: &str) -> Vec<Value> {
    rows.iter().map(|row| row[name].clone()).collect()
}
