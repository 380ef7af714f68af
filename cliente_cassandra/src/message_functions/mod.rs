pub mod body;
pub mod body_auth_token_maybe_empty;
pub mod body_authenticate;
pub mod body_batch;
pub mod body_error;
pub mod body_query;
pub mod body_rows;
pub mod body_startup;
pub mod body_void;
pub mod change_type;
pub mod column_spec;
pub mod consistency;
pub mod metadata;
pub mod primitivas;
pub mod query_parameters;
pub mod query_value;
pub mod row_content;
pub mod schema_change;
pub mod target;
pub mod value;
