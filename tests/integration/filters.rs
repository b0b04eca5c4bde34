//! Filter semantics over to-many relations

use crate::fixtures::{column, database, fetch, fetch_sql, sqlite, Employee, Office};
use pretty_assertions::assert_eq;
use sea_query::{Order, Value};
use undertow::{Filter, Query};

fn office_ids(filter: Filter) -> Vec<Value> {
    let conn = database();
    let mut query = Query::new(Office)
        .with_config(sqlite())
        .filter(filter)
        .order_by("id", Order::Asc);
    column(&fetch(&conn, &mut query), "id")
}

fn ids(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| Value::from(*id)).collect()
}

#[test]
fn unequal_excludes_offices_with_any_matching_employee() {
    // Duckburg also has Mickey in the Kitchen, but Donald works in Accounting
    assert_eq!(
        office_ids(Filter::unequal("employee.department.name", "Accounting")),
        ids(&[2, 3])
    );
}

#[test]
fn unlike_includes_offices_without_employees() {
    assert_eq!(office_ids(Filter::unlike("employee.name", "D*")), ids(&[2, 3]));
}

#[test]
fn conditions_on_one_to_many_path_match_the_same_row() {
    // Duckburg has a Donald and a Kitchen employee, but Donald is not in the Kitchen
    assert_eq!(
        office_ids(Filter::all([
            Filter::equal("employee.name", "Donald"),
            Filter::equal("employee.department.name", "Kitchen"),
        ])),
        ids(&[])
    );
    assert_eq!(
        office_ids(Filter::all([
            Filter::equal("employee.name", "Mickey"),
            Filter::equal("employee.department.name", "Kitchen"),
        ])),
        ids(&[1])
    );
}

#[test]
fn filter_only_join_does_not_repeat_base_rows() {
    assert_eq!(office_ids(Filter::like("employee.name", "*")), ids(&[1, 2]));
}

#[test]
fn none_of_mixes_to_many_and_base_children() {
    assert_eq!(
        office_ids(Filter::none_of([
            Filter::equal("employee.name", "Goofy"),
            Filter::equal("city", "Mouseton"),
        ])),
        ids(&[1])
    );
}

#[test]
fn any_of_nothing_matches_nothing() {
    assert_eq!(office_ids(Filter::any([])), ids(&[]));
}

#[test]
fn list_values() {
    assert_eq!(office_ids(Filter::equal("city", vec!["Duckburg", "Mouseton"])), ids(&[1, 3]));
    assert_eq!(office_ids(Filter::unequal("id", vec![1, 2])), ids(&[3]));
}

#[test]
fn count_matches_filtered_rows() {
    let conn = database();
    let mut query = Query::new(Office)
        .with_config(sqlite())
        .filter(Filter::like("employee.name", "*"))
        .order_by("id", Order::Desc)
        .limit(1);
    let statement = query.assemble_count().unwrap();
    let rows = fetch_sql(&conn, &query.config().dialect.render(&statement));
    assert_eq!(column(&rows, "count"), ids(&[2]));
}

#[test]
fn filter_only_subquery_keeps_rows_the_projection_cannot_tell_apart() {
    let conn = database();
    conn.execute_batch(
        "INSERT INTO office (id, city) VALUES (4, 'Duckburg');
         INSERT INTO employee (id, name, office_id, department_id) VALUES (4, 'Donald', 4, 2);",
    )
    .unwrap();

    let mut query = Query::new(Office)
        .with_config(sqlite())
        .columns(["city"])
        .filter(Filter::equal("employee.name", "Donald"))
        .order_by("id", Order::Desc);
    assert_eq!(
        column(&fetch(&conn, &mut query), "city"),
        vec![Value::from("Duckburg"), Value::from("Duckburg")]
    );
}

#[test]
fn none_of_nested_combinators_on_to_many_path() {
    assert_eq!(
        office_ids(Filter::none_of([Filter::any([Filter::equal("employee.name", "Donald")])])),
        ids(&[2, 3])
    );
    // nobody is Donald and in the Kitchen at once
    assert_eq!(
        office_ids(Filter::none_of([Filter::all([
            Filter::equal("employee.name", "Donald"),
            Filter::equal("employee.department.name", "Kitchen"),
        ])])),
        ids(&[1, 2, 3])
    );
    assert_eq!(
        office_ids(Filter::none_of([Filter::any([
            Filter::equal("employee.name", "Goofy"),
            Filter::equal("city", "Mouseton"),
        ])])),
        ids(&[1])
    );
}

#[test]
fn rewritten_condition_on_relation_path() {
    let conn = database();
    let mut query = Query::new(Employee)
        .with_config(sqlite())
        .columns(["name"])
        .filter(Filter::equal("department.name", "KITCHEN"))
        .order_by("id", Order::Asc);
    assert_eq!(
        column(&fetch(&conn, &mut query), "name"),
        vec![Value::from("Mickey"), Value::from("Goofy")]
    );

    assert_eq!(
        office_ids(Filter::unequal("employee.department.name", "accounting")),
        ids(&[2, 3])
    );
    assert_eq!(office_ids(Filter::equal("employee.department.name", "accounting")), ids(&[1]));
}
