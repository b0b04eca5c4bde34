//! Rows hydrated into nested records

use crate::fixtures::{database, fetch, sqlite, Base, Office};
use pretty_assertions::assert_eq;
use sea_query::{Order, Value};
use serde_json::json;
use undertow::Query;

#[test]
fn nested_relation_round_trip() {
    let conn = database();
    let mut query = Query::new(Base)
        .with_config(sqlite())
        .with("audit")
        .with("audit.user");
    let rows = fetch(&conn, &mut query);
    assert_eq!(rows.len(), 1);

    let records = query
        .result_set(rows.clone())
        .unwrap()
        .collect::<undertow::Result<Vec<_>>>()
        .unwrap();
    let user = records[0].related_path("audit.user").unwrap();
    assert_eq!(user.get("id").unwrap(), &rows[0]["base_audit_user_id"]);
    assert_eq!(user.get("active").unwrap(), &Value::from(false));
    assert_eq!(user.get("password").unwrap(), &Value::from("***"));
    assert_eq!(
        records[0].related("audit").unwrap().get("action").unwrap(),
        &Value::from("create")
    );
}

#[test]
fn result_set_is_lazy() {
    let conn = database();
    let mut query = Query::new(Office)
        .with_config(sqlite())
        .with("employee")
        .order_by("employee.id", Order::Asc);
    let rows = fetch(&conn, &mut query);
    let mut results = query.result_set(rows).unwrap();

    assert!(results.has_result());
    let first = results.next().unwrap().unwrap();
    assert_eq!(
        first.to_json(),
        json!({
            "id": 1,
            "city": "Duckburg",
            "employee": { "id": 1, "name": "Donald", "office_id": 1, "department_id": 1 }
        })
    );
    assert_eq!(results.count(), 2);
}
