//! Union models as virtual tables

use crate::fixtures::{column, database, fetch, fetch_sql, sqlite, Person};
use pretty_assertions::assert_eq;
use sea_query::{Order, Value};
use undertow::{Filter, UnionQuery};

fn names(names: &[&str]) -> Vec<Value> {
    names.iter().map(|name| Value::from(*name)).collect()
}

#[test]
fn filter_on_union_column() {
    let conn = database();
    let mut query = UnionQuery::new(Person)
        .with_config(sqlite())
        .filter(Filter::equal("kind", "user"))
        .order_by("name", Order::Asc);
    let rows = fetch(&conn, query.query_mut());
    assert_eq!(column(&rows, "name"), names(&["Gyro", "Scrooge"]));
    assert_eq!(column(&rows, "office_id"), vec![Value::String(None), Value::String(None)]);
}

#[test]
fn relation_of_union_model() {
    let conn = database();
    let mut query = UnionQuery::new(Person)
        .with_config(sqlite())
        .filter(Filter::equal("office.city", "Duckburg"))
        .order_by("name", Order::Asc);
    let rows = fetch(&conn, query.query_mut());
    assert_eq!(column(&rows, "name"), names(&["Donald", "Mickey"]));
}

#[test]
fn count_over_union() {
    let conn = database();
    let mut query = UnionQuery::new(Person).with_config(sqlite());
    let statement = query.assemble_count().unwrap();
    let rows = fetch_sql(&conn, &query.query().config().dialect.render(&statement));
    assert_eq!(column(&rows, "count"), vec![Value::from(5i64)]);
}
