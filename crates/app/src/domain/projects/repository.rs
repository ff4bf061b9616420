//! Projects Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    projects::records::{ProjectRecord, ProjectUuid},
    users::records::UserUuid,
};

const GET_PROJECT_SQL: &str = include_str!("sql/get_project.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProjectsRepository;

impl PgProjectsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_project(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        project: ProjectUuid,
    ) -> Result<Option<ProjectRecord>, sqlx::Error> {
        query_as::<Postgres, ProjectRecord>(GET_PROJECT_SQL)
            .bind(project.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProjectRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProjectUuid::from_uuid(row.try_get("uuid")?),
            creator_uuid: UserUuid::from_uuid(row.try_get("creator_uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}
