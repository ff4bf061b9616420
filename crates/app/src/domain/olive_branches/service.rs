//! Olive Branches Service

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date, tz::Offset};
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        olive_branches::{
            OliveBranchesServiceError,
            data::{NewOliveBranch, OliveBranchAction},
            records::{OliveBranchRecord, OliveBranchStatus, OliveBranchUuid},
            repository::PgOliveBranchesRepository,
        },
        projects::repository::PgProjectsRepository,
        quotas::{
            DAILY_FREE_ALLOWANCE,
            ledger::{QuotaLedger, today_at},
            records::QuotaSummary,
            repository::PgQuotaLedgerRepository,
        },
        users::{records::UserUuid, repository::PgUsersRepository},
    },
    pagination::Page,
};

#[derive(Debug, Clone)]
pub struct PgOliveBranchesService {
    db: Db,
    branches: PgOliveBranchesRepository,
    ledgers: PgQuotaLedgerRepository,
    projects: PgProjectsRepository,
    users: PgUsersRepository,
    day_offset: Offset,
}

impl PgOliveBranchesService {
    /// `day_offset` fixes the UTC offset at which the free allowance resets.
    #[must_use]
    pub fn new(db: Db, day_offset: Offset) -> Self {
        Self {
            db,
            branches: PgOliveBranchesRepository::new(),
            ledgers: PgQuotaLedgerRepository::new(),
            projects: PgProjectsRepository::new(),
            users: PgUsersRepository::new(),
            day_offset,
        }
    }

    fn today(&self) -> Date {
        today_at(Timestamp::now(), self.day_offset)
    }
}

#[async_trait]
impl OliveBranchesService for PgOliveBranchesService {
    #[tracing::instrument(
        name = "olive_branches.service.send_olive_branch",
        skip(self, branch),
        fields(
            sender_uuid = %sender,
            receiver_uuid = %branch.receiver_uuid,
            project_uuid = %branch.project_uuid,
            olive_branch_uuid = tracing::field::Empty,
            cost_type = tracing::field::Empty
        ),
        err
    )]
    async fn send_olive_branch(
        &self,
        sender: UserUuid,
        branch: NewOliveBranch,
    ) -> Result<OliveBranchRecord, OliveBranchesServiceError> {
        if branch.receiver_uuid == sender {
            return Err(OliveBranchesServiceError::SelfInvitation);
        }

        let mut tx = self.db.begin().await?;

        self.users
            .find_user(&mut tx, branch.receiver_uuid)
            .await?
            .ok_or(OliveBranchesServiceError::ReceiverNotFound)?;

        let project = self
            .projects
            .find_project(&mut tx, branch.project_uuid)
            .await?
            .ok_or(OliveBranchesServiceError::ProjectNotFound)?;

        if project.creator_uuid != sender {
            return Err(OliveBranchesServiceError::Forbidden);
        }

        self.ledgers.ensure_ledger(&mut tx, sender).await?;

        let ledger = self.ledgers.lock_ledger(&mut tx, sender).await?;

        if self
            .branches
            .exists_pending_between(&mut tx, sender, branch.receiver_uuid)
            .await?
        {
            return Err(OliveBranchesServiceError::AlreadyPending);
        }

        let (next, cost_type) = ledger
            .ledger()
            .consume(self.today())
            .map_err(|_exhausted| OliveBranchesServiceError::InsufficientQuota)?;

        self.ledgers.update_ledger(&mut tx, sender, next).await?;

        let record = self
            .branches
            .create_olive_branch(&mut tx, sender, &branch, cost_type)
            .await?;

        tx.commit().await?;

        let span = Span::current();

        span.record("olive_branch_uuid", tracing::field::display(record.uuid));
        span.record("cost_type", cost_type.as_str());

        info!(
            olive_branch_uuid = %record.uuid,
            cost_type = %cost_type,
            "sent olive branch"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "olive_branches.service.handle_olive_branch",
        skip(self),
        fields(receiver_uuid = %receiver, olive_branch_uuid = %branch),
        err
    )]
    async fn handle_olive_branch(
        &self,
        receiver: UserUuid,
        branch: OliveBranchUuid,
        action: OliveBranchAction,
    ) -> Result<OliveBranchRecord, OliveBranchesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .branches
            .find_olive_branch(&mut tx, branch)
            .await?
            .ok_or(OliveBranchesServiceError::NotFound)?;

        if record.receiver_uuid != receiver {
            return Err(OliveBranchesServiceError::Forbidden);
        }

        let next = action.resulting_status();

        if !record.status.can_transition_to(next) {
            return Err(OliveBranchesServiceError::AlreadyHandled(record.status));
        }

        let Some(updated) = self
            .branches
            .transition_status(&mut tx, branch, OliveBranchStatus::Pending, next)
            .await?
        else {
            let current = self
                .branches
                .find_olive_branch(&mut tx, branch)
                .await?
                .ok_or(OliveBranchesServiceError::NotFound)?;

            return Err(OliveBranchesServiceError::AlreadyHandled(current.status));
        };

        tx.commit().await?;

        info!(olive_branch_uuid = %branch, status = %updated.status, "handled olive branch");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "olive_branches.service.get_quota",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn get_quota(&self, user: UserUuid) -> Result<QuotaSummary, OliveBranchesServiceError> {
        let mut tx = self.db.begin().await?;

        let ledger = self
            .ledgers
            .get_ledger(&mut tx, user)
            .await?
            .map(|record| record.ledger())
            .unwrap_or_default();

        tx.commit().await?;

        Ok(summarise(ledger, self.today()))
    }

    #[tracing::instrument(
        name = "olive_branches.service.list_received",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_received(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, OliveBranchesServiceError> {
        let mut tx = self.db.begin().await?;

        let branches = self.branches.list_received(&mut tx, user, page).await?;

        tx.commit().await?;

        Ok(branches)
    }

    #[tracing::instrument(
        name = "olive_branches.service.list_sent",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_sent(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, OliveBranchesServiceError> {
        let mut tx = self.db.begin().await?;

        let branches = self.branches.list_sent(&mut tx, user, page).await?;

        tx.commit().await?;

        Ok(branches)
    }
}

fn summarise(ledger: QuotaLedger, today: Date) -> QuotaSummary {
    QuotaSummary {
        free_allowance: DAILY_FREE_ALLOWANCE,
        free_remaining: ledger.free_remaining(today),
        paid_balance: ledger.paid_balance,
    }
}

#[automock]
#[async_trait]
pub trait OliveBranchesService: Send + Sync {
    /// Invite `branch.receiver_uuid` to one of the sender's projects,
    /// spending a free invitation if any remain today, else a paid one.
    async fn send_olive_branch(
        &self,
        sender: UserUuid,
        branch: NewOliveBranch,
    ) -> Result<OliveBranchRecord, OliveBranchesServiceError>;

    /// Accept or reject a pending invitation addressed to `receiver`.
    async fn handle_olive_branch(
        &self,
        receiver: UserUuid,
        branch: OliveBranchUuid,
        action: OliveBranchAction,
    ) -> Result<OliveBranchRecord, OliveBranchesServiceError>;

    /// The user's remaining quota for today. Read-only.
    async fn get_quota(&self, user: UserUuid) -> Result<QuotaSummary, OliveBranchesServiceError>;

    async fn list_received(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, OliveBranchesServiceError>;

    async fn list_sent(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, OliveBranchesServiceError>;
}
