use entity::users;
use sea_orm::{ConnectionTrait, DbErr, Schema};

/// Create every managed table from its entity definition.
/// Existing tables are left untouched.
pub async fn sync_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statement = schema.create_table_from_entity(users::Entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;

    tracing::debug!(table = "users", ?backend, "schema synchronized");
    Ok(())
}
