//! Join emission against real rows

use crate::fixtures::{column, database, fetch, sqlite, Car, Office};
use pretty_assertions::assert_eq;
use sea_query::{Order, Value};
use undertow::{Filter, Query};

fn names(names: &[&str]) -> Vec<Value> {
    names.iter().map(|name| Value::from(*name)).collect()
}

#[test]
fn path_required_many_times_is_joined_once() {
    let conn = database();
    let mut query = Query::new(Office)
        .with_config(sqlite())
        .columns(["city", "employee.name"])
        .with("employee")
        .filter(Filter::equal("employee.name", "Donald"))
        .order_by("employee.name", Order::Asc);

    let sql = query.to_sql().unwrap();
    assert_eq!(sql.matches(r#"JOIN "employee""#).count(), 1);

    let rows = fetch(&conn, &mut query);
    assert_eq!(column(&rows, "office_employee_name"), names(&["Donald"]));
}

#[test]
fn eager_to_many_is_inner_joined_unless_optional() {
    let conn = database();
    let mut inner = Query::new(Office)
        .with_config(sqlite())
        .with("employee")
        .order_by("id", Order::Asc);
    assert_eq!(fetch(&conn, &mut inner).len(), 3);

    let mut optional = Query::new(Office)
        .with_config(sqlite())
        .with_optional("employee")
        .order_by("id", Order::Asc)
        .order_by("employee.id", Order::Asc);
    let rows = fetch(&conn, &mut optional);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3]["office_id"], Value::from(3i64));
    assert_eq!(rows[3]["office_employee_name"], Value::String(None));
}

#[test]
fn many_to_many_with_custom_junction_keys() {
    let conn = database();
    let mut query = Query::new(Car)
        .with_config(sqlite())
        .columns(["name", "user.name"])
        .order_by("id", Order::Asc)
        .order_by("user.name", Order::Asc);
    let rows = fetch(&conn, &mut query);
    assert_eq!(column(&rows, "name"), names(&["Model T", "Beetle", "Beetle"]));
    assert_eq!(column(&rows, "car_user_name"), names(&["Scrooge", "Gyro", "Scrooge"]));
}

#[test]
fn many_to_many_negation() {
    let conn = database();
    let mut query = Query::new(Car)
        .with_config(sqlite())
        .filter(Filter::unequal("user.name", "Scrooge"))
        .order_by("id", Order::Asc);
    assert_eq!(column(&fetch(&conn, &mut query), "name"), names(&["Mini"]));

    let mut query = Query::new(Car)
        .with_config(sqlite())
        .filter(Filter::equal("user.name", "Gyro"));
    assert_eq!(column(&fetch(&conn, &mut query), "name"), names(&["Beetle"]));
}
