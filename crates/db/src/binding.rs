//! Binding of builder-produced column lists onto sqlx queries.

use quill_core::revision::{ColumnValue, FieldValue};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;

/// Bind `columns` in order, matching the `$1..$n` placeholders produced by
/// `render_insert` / `render_update`.
pub(crate) fn bind_columns<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    columns: &[ColumnValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for column in columns {
        query = match &column.value {
            FieldValue::Text(v) => query.bind(v.clone()),
            FieldValue::Flag(v) => query.bind(*v),
            FieldValue::Id(v) => query.bind(*v),
            FieldValue::Number(v) => query.bind(*v),
            FieldValue::Time(v) => query.bind(*v),
        };
    }
    query
}
