//! Repository of typed operations over the document store.
//!
//! Every operation re-fetches what it needs and writes back whole property
//! values; the store exposes no transactions, so multi-step mutations are
//! read-modify-write with the races that implies (single-writer-per-record
//! in practice).

use std::sync::Arc;

use chrono::Utc;

use super::props::{Filter, Page, Properties, Property, Sort};
use super::Datastore;
use crate::config::DatabaseIds;
use crate::errors::AppError;
use crate::hackatime::HackatimeClient;
use crate::models::{
    Devlog, Event, HackatimeLink, JoinRequest, JoinRequestStatus, LinkedHackatimeProject, Member,
    NewsPost, Project, ProjectStatus, ProjectSummary, PurchaseRecord, RankedMember, RelatedEvent,
    RosterMember, SettingValue, Settings, StockStatus, StoreItem, Team, TeamStanding,
    TeamVisibility,
};

/// Repository for all data operations.
pub struct Repository {
    store: Arc<dyn Datastore>,
    ids: DatabaseIds,
}

impl Repository {
    pub fn new(store: Arc<dyn Datastore>, ids: DatabaseIds) -> Self {
        Self { store, ids }
    }

    // ==================== MEMBER OPERATIONS ====================

    /// Find a member by Slack id (the stable identity key).
    pub async fn find_member_by_slack_id(
        &self,
        slack_id: &str,
    ) -> Result<Option<Member>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.members,
                Some(Filter::text_equals("Slack ID", slack_id)),
                &[],
            )
            .await?;
        Ok(pages.first().map(member_from_page))
    }

    /// Fallback lookup by Slack display name, used by the bot commands.
    pub async fn find_member_by_slack_name(
        &self,
        slack_name: &str,
    ) -> Result<Option<Member>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.members,
                Some(Filter::text_equals("Slack Name", slack_name)),
                &[],
            )
            .await?;
        Ok(pages.first().map(member_from_page))
    }

    pub async fn find_member_by_invite_id(
        &self,
        invite_id: &str,
    ) -> Result<Option<Member>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.members,
                Some(Filter::text_equals("Invite ID", invite_id)),
                &[],
            )
            .await?;
        Ok(pages.first().map(member_from_page))
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        let pages = self.store.query(&self.ids.members, None, &[]).await?;
        Ok(pages.iter().map(member_from_page).collect())
    }

    /// Create a member record on first login: zero balance, not banned.
    pub async fn create_member(
        &self,
        name: &str,
        email: &str,
        slack_id: &str,
        slack_name: &str,
    ) -> Result<Member, AppError> {
        let properties = Properties::from_iter([
            ("Name".to_string(), Property::title(name)),
            ("Email Address".to_string(), Property::email(email)),
            ("Slack ID".to_string(), Property::text(slack_id)),
            ("Slack Name".to_string(), Property::text(slack_name)),
            ("Experience Points".to_string(), Property::number(0.0)),
            ("Banned".to_string(), Property::checkbox(false)),
        ]);
        let page = self.store.create(&self.ids.members, properties).await?;
        Ok(member_from_page(&page))
    }

    /// Current balance for one member; degrades to 0 on any failure.
    pub async fn member_xp(&self, slack_id: &str) -> i64 {
        match self.find_member_by_slack_id(slack_id).await {
            Ok(Some(member)) => member.xp,
            Ok(None) => 0,
            Err(err) => {
                tracing::error!("Error fetching member XP: {}", err);
                0
            }
        }
    }

    /// Set or clear a member's ban. Returns the member when found.
    pub async fn set_ban(
        &self,
        slack_id: &str,
        banned: bool,
        reason: &str,
    ) -> Result<Option<Member>, AppError> {
        let Some(member) = self.find_member_by_slack_id(slack_id).await? else {
            return Ok(None);
        };
        let properties = Properties::from_iter([
            ("Banned".to_string(), Property::checkbox(banned)),
            ("Ban reason".to_string(), Property::select(reason)),
        ]);
        self.store.update(&member.record_id, properties).await?;
        Ok(Some(member))
    }

    // ==================== STORE OPERATIONS ====================

    /// List the catalog, category then price ascending, with related events
    /// denormalized one lookup at a time.
    pub async fn list_store_items(&self) -> Result<Vec<StoreItem>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.store_items,
                None,
                &[Sort::ascending("Category"), Sort::ascending("XP Price")],
            )
            .await?;

        let mut items = Vec::with_capacity(pages.len());
        for page in &pages {
            let mut item = store_item_from_page(page);
            if let Some(event_id) = relation_id(page, "Event") {
                item.related_event = self.related_event(&event_id).await;
            }
            items.push(item);
        }
        Ok(items)
    }

    async fn related_event(&self, event_id: &str) -> Option<RelatedEvent> {
        match self.store.retrieve(event_id).await {
            Ok(page) => Some(RelatedEvent {
                id: page.id.clone(),
                name: page.text("Name"),
                day_of_week: page.text("Day of week"),
                hour: page.text("Hour"),
            }),
            Err(err) => {
                tracing::error!("Error fetching related event {}: {}", event_id, err);
                None
            }
        }
    }

    /// Fetch one catalog item; lookup failures degrade to absent.
    pub async fn get_store_item(&self, item_id: &str) -> Result<Option<StoreItem>, AppError> {
        match self.store.retrieve(item_id).await {
            Ok(page) => Ok(Some(store_item_from_page(&page))),
            Err(err) => {
                tracing::error!("Error fetching store item {}: {}", item_id, err);
                Ok(None)
            }
        }
    }

    /// Purchase an item: stock, affordability and per-person limit checks,
    /// then one update writing the appended ledger and the new balance.
    pub async fn purchase(
        &self,
        member: &Member,
        item: &StoreItem,
    ) -> Result<(PurchaseRecord, i64), AppError> {
        if item.stock_status != StockStatus::InStock {
            return Err(AppError::Validation("Item is not in stock".to_string()));
        }
        if member.xp < item.xp_price {
            return Err(AppError::Validation("Insufficient XP".to_string()));
        }
        if item.limit_per_person > 0 {
            let prior = member
                .purchases
                .iter()
                .filter(|p| p.item_id == item.id)
                .count() as i64;
            if prior >= item.limit_per_person {
                return Err(AppError::Validation(
                    "Purchase limit reached for this item".to_string(),
                ));
            }
        }

        let record = PurchaseRecord {
            id: Some(uuid::Uuid::new_v4().to_string()),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            category: item.category.clone(),
            xp_price: item.xp_price,
            purchased_at: Utc::now().to_rfc3339(),
            used: false,
            used_at: None,
        };

        let mut purchases = member.purchases.clone();
        purchases.push(record.clone());
        let new_xp = member.xp - item.xp_price;

        let properties = Properties::from_iter([
            (
                "Experience Points".to_string(),
                Property::number(new_xp as f64),
            ),
            (
                "Store Items Bought (JSON)".to_string(),
                Property::text(&serde_json::to_string(&purchases)?),
            ),
        ]);
        self.store.update(&member.record_id, properties).await?;

        Ok((record, new_xp))
    }

    /// Toggle the used flag on one ledger entry, addressed by array index.
    pub async fn toggle_usage(
        &self,
        member: &Member,
        purchase_index: usize,
        mark_as_used: bool,
    ) -> Result<PurchaseRecord, AppError> {
        let mut purchases = member.purchases.clone();
        if purchase_index >= purchases.len() {
            return Err(AppError::Validation("Invalid purchase index".to_string()));
        }

        purchases[purchase_index].used = mark_as_used;
        purchases[purchase_index].used_at = if mark_as_used {
            Some(Utc::now().to_rfc3339())
        } else {
            None
        };

        let properties = Properties::from_iter([(
            "Store Items Bought (JSON)".to_string(),
            Property::text(&serde_json::to_string(&purchases)?),
        )]);
        self.store.update(&member.record_id, properties).await?;

        Ok(purchases[purchase_index].clone())
    }

    // ==================== TEAM OPERATIONS ====================

    async fn find_team_page(&self, team_id: &str) -> Result<Option<Page>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.teams,
                Some(Filter::text_equals("Team ID", team_id)),
                &[],
            )
            .await?;
        Ok(pages.into_iter().next())
    }

    pub async fn find_team_by_team_id(&self, team_id: &str) -> Result<Option<Team>, AppError> {
        Ok(self
            .find_team_page(team_id)
            .await?
            .as_ref()
            .map(team_from_page))
    }

    /// Resolve a team name with the caller's fallback; lookups degrade to it.
    pub async fn team_name_or(&self, team_id: &str, fallback: &str) -> String {
        if team_id.is_empty() {
            return fallback.to_string();
        }
        match self.find_team_page(team_id).await {
            Ok(Some(page)) => {
                let name = page.text("Team Name");
                if name.is_empty() {
                    fallback.to_string()
                } else {
                    name
                }
            }
            Ok(None) => fallback.to_string(),
            Err(err) => {
                tracing::error!("Error fetching team name: {}", err);
                fallback.to_string()
            }
        }
    }

    /// List all teams with rosters enriched with each member's current XP.
    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        let pages = self.store.query(&self.ids.teams, None, &[]).await?;
        let mut teams = Vec::with_capacity(pages.len());
        for page in &pages {
            let mut team = team_from_page(page);
            for member in &mut team.members {
                member.xp = Some(self.member_xp(&member.id).await);
            }
            teams.push(team);
        }
        Ok(teams)
    }

    /// Create a team with the caller as sole member, then point the caller's
    /// record at it. Two writes with no atomicity between them.
    pub async fn create_team(
        &self,
        member: &Member,
        team_name: &str,
        visibility: TeamVisibility,
    ) -> Result<String, AppError> {
        if member.has_team() {
            return Err(AppError::Validation(
                "User is already on a team".to_string(),
            ));
        }

        let team_id = uuid::Uuid::new_v4().to_string();
        let roster = vec![RosterMember {
            id: member.slack_id.clone(),
            name: member.name.clone(),
            slack_name: member.slack_name.clone(),
            xp: None,
        }];

        let properties = Properties::from_iter([
            ("Team Name".to_string(), Property::text(team_name)),
            ("Team ID".to_string(), Property::text(&team_id)),
            ("Team Size".to_string(), Property::number(1.0)),
            (
                "Members (JSON)".to_string(),
                Property::text(&serde_json::to_string(&roster)?),
            ),
            ("Projects (JSON)".to_string(), Property::text("[]")),
            ("Join Requests (JSON)".to_string(), Property::text("[]")),
            ("Type".to_string(), Property::select(visibility.as_str())),
        ]);
        self.store.create(&self.ids.teams, properties).await?;

        let user_update =
            Properties::from_iter([("Team ID".to_string(), Property::text(&team_id))]);
        self.store.update(&member.record_id, user_update).await?;

        Ok(team_id)
    }

    /// Join an open team: the caller's record first, then the roster and the
    /// denormalized size in one team update.
    pub async fn join_team(&self, member: &Member, team_id: &str) -> Result<(), AppError> {
        if member.has_team() {
            return Err(AppError::Validation(
                "User is already on a team".to_string(),
            ));
        }

        let team = self
            .find_team_by_team_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.visibility == TeamVisibility::Private {
            return Err(AppError::Forbidden("Cannot join private team".to_string()));
        }

        let user_update =
            Properties::from_iter([("Team ID".to_string(), Property::text(team_id))]);
        self.store.update(&member.record_id, user_update).await?;

        let mut roster = team.members;
        roster.push(RosterMember {
            id: member.slack_id.clone(),
            name: member.name.clone(),
            slack_name: member.slack_name.clone(),
            xp: None,
        });

        let team_update = Properties::from_iter([
            (
                "Members (JSON)".to_string(),
                Property::text(&serde_json::to_string(&roster)?),
            ),
            (
                "Team Size".to_string(),
                Property::number(roster.len() as f64),
            ),
        ]);
        self.store.update(&team.record_id, team_update).await?;

        Ok(())
    }

    /// File a join request against an "Ask for invite" team. Duplicates are
    /// keyed by requester id alone, regardless of prior status.
    pub async fn request_join(&self, member: &Member, team_id: &str) -> Result<(), AppError> {
        if member.has_team() {
            return Err(AppError::Validation(
                "User is already on a team".to_string(),
            ));
        }

        let team = self
            .find_team_by_team_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.visibility != TeamVisibility::AskForInvite {
            return Err(AppError::Validation(
                "This team does not accept join requests".to_string(),
            ));
        }

        if team.join_requests.iter().any(|r| r.id == member.slack_id) {
            return Err(AppError::Validation("Join request already sent".to_string()));
        }

        let mut requests = team.join_requests;
        requests.push(JoinRequest {
            id: member.slack_id.clone(),
            name: member.name.clone(),
            slack_name: member.slack_name.clone(),
            request_date: Utc::now().to_rfc3339(),
            status: JoinRequestStatus::Pending,
        });

        let team_update = Properties::from_iter([(
            "Join Requests (JSON)".to_string(),
            Property::text(&serde_json::to_string(&requests)?),
        )]);
        self.store.update(&team.record_id, team_update).await?;

        Ok(())
    }

    /// Leave the current team; the last member leaving deletes the team
    /// record outright. Roster cleanup failures are logged, not surfaced.
    pub async fn leave_team(&self, member: &Member) -> Result<(), AppError> {
        if !member.has_team() {
            return Err(AppError::Validation("User is not on a team".to_string()));
        }

        let user_update = Properties::from_iter([("Team ID".to_string(), Property::text(""))]);
        self.store.update(&member.record_id, user_update).await?;

        match self.find_team_page(&member.team_id).await {
            Ok(Some(page)) => {
                let team = team_from_page(&page);
                let roster: Vec<RosterMember> = team
                    .members
                    .into_iter()
                    .filter(|m| m.id != member.slack_id)
                    .collect();

                let result = if roster.is_empty() {
                    self.store.delete(&page.id).await
                } else {
                    let serialized = serde_json::to_string(&roster).unwrap_or_default();
                    let team_update = Properties::from_iter([
                        ("Members (JSON)".to_string(), Property::text(&serialized)),
                        (
                            "Team Size".to_string(),
                            Property::number(roster.len() as f64),
                        ),
                    ]);
                    self.store.update(&page.id, team_update).await.map(|_| ())
                };
                if let Err(err) = result {
                    tracing::error!("Error updating team members: {}", err);
                }
            }
            Ok(None) => {}
            Err(err) => tracing::error!("Error fetching team: {}", err),
        }

        Ok(())
    }

    // ==================== PROJECT OPERATIONS ====================

    async fn find_project_page(&self, project_id: &str) -> Result<Option<Page>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.projects,
                Some(Filter::text_equals("Project ID", project_id)),
                &[],
            )
            .await?;
        Ok(pages.into_iter().next())
    }

    /// Find a project by its generated id, with the team name resolved.
    pub async fn find_project_by_project_id(
        &self,
        project_id: &str,
    ) -> Result<Option<Project>, AppError> {
        let Some(page) = self.find_project_page(project_id).await? else {
            return Ok(None);
        };
        let mut project = project_from_page(&page);
        project.team_name = self.team_name_or(&project.team_id, "Unknown Team").await;
        Ok(Some(project))
    }

    /// List all projects with team names and member display names resolved.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, AppError> {
        let pages = self.store.query(&self.ids.projects, None, &[]).await?;
        let mut projects = Vec::with_capacity(pages.len());
        for page in &pages {
            let project = project_from_page(page);
            let team_name = self.team_name_or(&project.team_id, "Unknown Team").await;
            let members = self.team_member_names(&project.team_id).await;
            let description = if project.description.is_empty() {
                "No description provided".to_string()
            } else {
                project.description
            };
            projects.push(ProjectSummary {
                id: project.id,
                name: project.name,
                description,
                status: project.status,
                team_id: project.team_id,
                team_name,
                members,
                created_at: project.date_submitted.clone(),
                updated_at: project.date_submitted,
            });
        }
        Ok(projects)
    }

    async fn team_member_names(&self, team_id: &str) -> Vec<String> {
        if team_id.is_empty() {
            return Vec::new();
        }
        match self.find_team_page(team_id).await {
            Ok(Some(page)) => team_from_page(&page)
                .members
                .into_iter()
                .map(|m| {
                    if m.name.is_empty() {
                        m.slack_name
                    } else {
                        m.name
                    }
                })
                .collect(),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::error!("Error fetching team members: {}", err);
                Vec::new()
            }
        }
    }

    /// Create a project for the caller's team. Names are unique per team;
    /// the same name on another team is fine.
    pub async fn create_project(
        &self,
        member: &Member,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<Project, AppError> {
        if !member.has_team() {
            return Err(AppError::Validation(
                "User must be on a team to create projects".to_string(),
            ));
        }

        let name = project_name.trim();
        let existing = self
            .store
            .query(
                &self.ids.projects,
                Some(Filter::And(vec![
                    Filter::text_equals("Team ID", &member.team_id),
                    Filter::title_equals("Name", name),
                ])),
                &[],
            )
            .await?;
        if !existing.is_empty() {
            return Err(AppError::Validation(
                "Project with this name already exists".to_string(),
            ));
        }

        let project_id = uuid::Uuid::new_v4().to_string();
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("No description provided");
        let date_submitted = Utc::now().date_naive().to_string();

        let properties = Properties::from_iter([
            ("Name".to_string(), Property::title(name)),
            ("Description".to_string(), Property::text(description)),
            ("Team ID".to_string(), Property::text(&member.team_id)),
            ("Project ID".to_string(), Property::text(&project_id)),
            (
                "Status".to_string(),
                Property::select(ProjectStatus::Created.as_str()),
            ),
            ("Date Submitted".to_string(), Property::date(&date_submitted)),
            ("Hackatime Hours".to_string(), Property::number(0.0)),
        ]);
        let page = self.store.create(&self.ids.projects, properties).await?;

        // Best-effort: record the project name on the owning team
        if let Err(err) = self.append_team_project(&member.team_id, name).await {
            tracing::error!("Error updating team projects: {}", err);
        }

        Ok(project_from_page(&page))
    }

    async fn append_team_project(&self, team_id: &str, project_name: &str) -> Result<(), AppError> {
        let Some(page) = self.find_team_page(team_id).await? else {
            return Ok(());
        };
        let mut projects: Vec<String> = parse_json_array(&page.text("Projects (JSON)"));
        projects.push(project_name.to_string());
        let team_update = Properties::from_iter([(
            "Projects (JSON)".to_string(),
            Property::text(&serde_json::to_string(&projects)?),
        )]);
        self.store.update(&page.id, team_update).await?;
        Ok(())
    }

    /// Partial update of description and/or git repo.
    pub async fn update_project(
        &self,
        project: &Project,
        description: Option<&str>,
        git_repo: Option<&str>,
    ) -> Result<(), AppError> {
        let mut properties = Properties::new();
        if let Some(description) = description {
            properties.insert(
                "Description".to_string(),
                Property::text(description.trim()),
            );
        }
        if let Some(git_repo) = git_repo {
            let trimmed = git_repo.trim();
            let value = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
            properties.insert("Git Repo".to_string(), Property::url(value));
        }
        if properties.is_empty() {
            return Ok(());
        }
        self.store.update(&project.record_id, properties).await?;
        Ok(())
    }

    /// Append a devlog; the first one moves a freshly created project into
    /// "In development".
    pub async fn add_devlog(
        &self,
        project: &Project,
        author: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<Devlog, AppError> {
        let devlog = Devlog {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.trim().to_string(),
            image_url: image_url
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            timestamp: Utc::now().to_rfc3339(),
            author: author.to_string(),
        };

        let mut devlogs = project.devlogs.clone();
        devlogs.push(devlog.clone());

        let mut properties = Properties::from_iter([(
            "Devlogs (JSON)".to_string(),
            Property::text(&serde_json::to_string(&devlogs)?),
        )]);
        if project.status == ProjectStatus::Created {
            properties.insert(
                "Status".to_string(),
                Property::select(ProjectStatus::InDevelopment.as_str()),
            );
        }
        self.store.update(&project.record_id, properties).await?;

        Ok(devlog)
    }

    /// Link a Hackatime project for the calling member and recompute hours.
    pub async fn link_hackatime(
        &self,
        hackatime: &HackatimeClient,
        project: &Project,
        member: &Member,
        project_name: &str,
    ) -> Result<(LinkedHackatimeProject, f64), AppError> {
        let name = project_name.trim();

        let duplicate = project.hackatime_projects.iter().any(|link| match link {
            HackatimeLink::Linked(l) => l.project_name == name && l.user_id == member.slack_id,
            HackatimeLink::Legacy(_) => false,
        });
        if duplicate {
            return Err(AppError::Validation(
                "This Hackatime project is already linked for you".to_string(),
            ));
        }

        let link = LinkedHackatimeProject {
            project_name: name.to_string(),
            user_id: member.slack_id.clone(),
            user_name: or_unknown(&member.name),
            user_slack_name: or_unknown(&member.slack_name),
        };

        let mut links = project.hackatime_projects.clone();
        links.push(HackatimeLink::Linked(link.clone()));

        let hours = self
            .recompute_project_hours(hackatime, &project.id, &links)
            .await;

        let mut properties = Properties::from_iter([
            (
                "Hackatime Projects (JSON)".to_string(),
                Property::text(&serde_json::to_string(&links)?),
            ),
            ("Hackatime Hours".to_string(), Property::number(hours)),
        ]);
        if project.status == ProjectStatus::Created {
            properties.insert(
                "Status".to_string(),
                Property::select(ProjectStatus::InDevelopment.as_str()),
            );
        }
        self.store.update(&project.record_id, properties).await?;

        Ok((link, hours))
    }

    /// Remove a Hackatime link (legacy strings match on name alone) and
    /// recompute hours.
    pub async fn unlink_hackatime(
        &self,
        hackatime: &HackatimeClient,
        project: &Project,
        caller_slack_id: &str,
        project_name: &str,
        user_id: Option<&str>,
    ) -> Result<f64, AppError> {
        let name = project_name.trim();
        let target = user_id.unwrap_or(caller_slack_id);

        let links: Vec<HackatimeLink> = project
            .hackatime_projects
            .iter()
            .filter(|link| !link.matches(name, target))
            .cloned()
            .collect();

        let hours = self
            .recompute_project_hours(hackatime, &project.id, &links)
            .await;

        let properties = Properties::from_iter([
            (
                "Hackatime Projects (JSON)".to_string(),
                Property::text(&serde_json::to_string(&links)?),
            ),
            ("Hackatime Hours".to_string(), Property::number(hours)),
        ]);
        self.store.update(&project.record_id, properties).await?;

        Ok(hours)
    }

    /// Sum tracked hours across links: one stats fetch per object link, one
    /// per team member for legacy string links. O(members × links) worst
    /// case, tolerable at hackathon team sizes.
    pub async fn recompute_project_hours(
        &self,
        hackatime: &HackatimeClient,
        project_id: &str,
        links: &[HackatimeLink],
    ) -> f64 {
        let mut total_hours = 0.0;

        for link in links {
            match link {
                HackatimeLink::Linked(l) => {
                    if let Some(stats) = hackatime.stats(&l.user_id).await {
                        total_hours += stats.project_hours(&l.project_name);
                    }
                }
                HackatimeLink::Legacy(name) => {
                    let Ok(Some(page)) = self.find_project_page(project_id).await else {
                        continue;
                    };
                    let team_id = page.text("Team ID");
                    let Ok(Some(team_page)) = self.find_team_page(&team_id).await else {
                        continue;
                    };
                    let roster: Vec<RosterMember> =
                        parse_json_array(&team_page.text("Members (JSON)"));
                    for member in roster {
                        if let Some(stats) = hackatime.stats(&member.id).await {
                            total_hours += stats.project_hours(name);
                        }
                    }
                }
            }
        }

        (total_hours * 100.0).round() / 100.0
    }

    /// Write a project's status directly; no prior-state validation, matching
    /// the admin surfaces. Returns the project when found.
    pub async fn set_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Project>, AppError> {
        let Some(page) = self.find_project_page(project_id).await? else {
            return Ok(None);
        };
        let project = project_from_page(&page);

        let mut properties = Properties::from_iter([(
            "Status".to_string(),
            Property::select(status.as_str()),
        )]);
        if let Some(reason) = rejection_reason {
            properties.insert("Rejection Reason".to_string(), Property::text(reason));
        }
        self.store.update(&page.id, properties).await?;

        Ok(Some(project))
    }

    /// All projects owned by one team.
    pub async fn projects_for_team(&self, team_id: &str) -> Result<Vec<Project>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.projects,
                Some(Filter::text_equals("Team ID", team_id)),
                &[],
            )
            .await?;
        Ok(pages.iter().map(project_from_page).collect())
    }

    /// All members whose record points at one team.
    pub async fn members_for_team(&self, team_id: &str) -> Result<Vec<Member>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.members,
                Some(Filter::text_equals("Team ID", team_id)),
                &[],
            )
            .await?;
        Ok(pages.iter().map(member_from_page).collect())
    }

    /// Member and project totals for the stats command.
    pub async fn totals(&self) -> Result<(usize, usize), AppError> {
        let members = self.store.query(&self.ids.members, None, &[]).await?;
        let projects = self.store.query(&self.ids.projects, None, &[]).await?;
        Ok((members.len(), projects.len()))
    }

    /// All projects awaiting review.
    pub async fn pending_projects(&self) -> Result<Vec<Project>, AppError> {
        let pages = self.store.query(&self.ids.projects, None, &[]).await?;
        Ok(pages
            .iter()
            .map(project_from_page)
            .filter(|p| p.status == ProjectStatus::Submitted)
            .collect())
    }

    // ==================== FEED OPERATIONS ====================

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.events,
                None,
                &[Sort::ascending("Day of week"), Sort::ascending("Hour")],
            )
            .await?;
        Ok(pages.iter().map(event_from_page).collect())
    }

    pub async fn list_news(&self) -> Result<Vec<NewsPost>, AppError> {
        let pages = self
            .store
            .query(
                &self.ids.news,
                None,
                &[Sort::descending("Publication Date")],
            )
            .await?;
        Ok(pages.iter().map(news_from_page).collect())
    }

    /// Fold the settings pages into a flag map; `"true"`/`"false"` become
    /// booleans.
    pub async fn settings(&self) -> Result<Settings, AppError> {
        let pages = self.store.query(&self.ids.settings, None, &[]).await?;
        let mut settings = Settings::new();
        for page in &pages {
            let item = page.text("Item");
            if item.is_empty() {
                continue;
            }
            let value = page.text("Value");
            let value = match value.as_str() {
                "true" => SettingValue::Flag(true),
                "false" => SettingValue::Flag(false),
                _ => SettingValue::Text(value),
            };
            settings.insert(item, value);
        }
        Ok(settings)
    }

    // ==================== LEADERBOARD ====================

    /// Individual and team rankings. One team-name lookup per member and one
    /// balance lookup per roster entry, matching the rest of the app's
    /// fetch-fresh approach.
    pub async fn leaderboard(&self) -> Result<(Vec<RankedMember>, Vec<TeamStanding>), AppError> {
        let members = self.list_members().await?;

        let mut users = Vec::new();
        for member in members {
            if member.banned || member.xp <= 0 {
                continue;
            }
            let team_name = self.team_name_or(&member.team_id, "No Team Assigned").await;
            users.push(RankedMember {
                id: member.slack_id,
                name: member.name,
                slack_name: member.slack_name,
                xp: member.xp,
                team_id: member.team_id,
                team_name,
                rank: 0,
            });
        }
        users.sort_by(|a, b| b.xp.cmp(&a.xp));
        users.truncate(100);
        for (index, user) in users.iter_mut().enumerate() {
            user.rank = index + 1;
        }

        let team_pages = self.store.query(&self.ids.teams, None, &[]).await?;
        let mut standings = Vec::new();
        for page in &team_pages {
            let team = team_from_page(page);
            if team.name.is_empty() || team.members.is_empty() {
                continue;
            }
            let mut total_xp = 0;
            for member in &team.members {
                total_xp += self.member_xp(&member.id).await;
            }
            let member_count = team.members.len();
            standings.push(TeamStanding {
                team_name: team.name,
                total_xp,
                member_count,
                average_xp: ((total_xp as f64) / (member_count as f64)).round() as i64,
                rank: 0,
            });
        }
        standings.sort_by(|a, b| b.total_xp.cmp(&a.total_xp));
        for (index, standing) in standings.iter_mut().enumerate() {
            standing.rank = index + 1;
        }

        Ok((users, standings))
    }
}

// Helper functions for page conversion

fn member_from_page(page: &Page) -> Member {
    Member {
        record_id: page.id.clone(),
        name: page.text("Name"),
        email: page.text("Email Address"),
        slack_id: page.text("Slack ID"),
        slack_name: page.text("Slack Name"),
        xp: page.number("Experience Points") as i64,
        team_id: page.text("Team ID"),
        banned: page.boolean("Banned"),
        ban_reason: page.text("Ban reason"),
        invite_id: page.text("Invite ID"),
        purchases: parse_json_array(&page.text("Store Items Bought (JSON)")),
    }
}

fn team_from_page(page: &Page) -> Team {
    Team {
        record_id: page.id.clone(),
        team_id: page.text("Team ID"),
        name: page.text("Team Name"),
        team_size: page.number("Team Size") as i64,
        members: parse_json_array(&page.text("Members (JSON)")),
        projects: parse_json_array(&page.text("Projects (JSON)")),
        join_requests: parse_json_array(&page.text("Join Requests (JSON)")),
        visibility: TeamVisibility::from_str(&page.text("Type"))
            .unwrap_or(TeamVisibility::Public),
        created_time: page.created_time.clone(),
        last_edited_time: page.last_edited_time.clone(),
    }
}

fn project_from_page(page: &Page) -> Project {
    Project {
        record_id: page.id.clone(),
        id: page.text("Project ID"),
        name: page.text("Name"),
        description: page.text("Description"),
        status: ProjectStatus::from_str(&page.text("Status")).unwrap_or(ProjectStatus::Created),
        team_id: page.text("Team ID"),
        team_name: String::new(),
        git_repo: page.text("Git Repo"),
        date_submitted: page.text("Date Submitted"),
        hackatime_hours: page.number("Hackatime Hours"),
        rejection_reason: page.text("Rejection Reason"),
        devlogs: parse_json_array(&page.text("Devlogs (JSON)")),
        hackatime_projects: parse_json_array(&page.text("Hackatime Projects (JSON)")),
    }
}

fn store_item_from_page(page: &Page) -> StoreItem {
    StoreItem {
        id: page.id.clone(),
        name: page.text("Name"),
        description: page.text("Description"),
        xp_price: page.number("XP Price") as i64,
        stock_status: StockStatus::from_str(&page.text("Stock Status"))
            .unwrap_or(StockStatus::NoStock),
        category: {
            let category = page.text("Category");
            if category.is_empty() {
                "Other".to_string()
            } else {
                category
            }
        },
        limit_per_person: page.number("Limit per person") as i64,
        related_event: None,
        created_time: page.created_time.clone(),
        last_edited_time: page.last_edited_time.clone(),
    }
}

fn event_from_page(page: &Page) -> Event {
    let extras = multi_select_names(page, "Extras");
    let is_main_event = extras.iter().any(|t| t.as_str() == "Main event");
    let is_store_unlockable = extras.iter().any(|t| t.as_str() == "Store-unlockable");
    let has_limited_attendees = extras.iter().any(|t| t.as_str() == "Limited attendees");

    Event {
        id: page.id.clone(),
        name: page.text("Name"),
        location: page.text("Location"),
        description: page.text("Description"),
        day_of_week: page.text("Day of week"),
        hour: page.text("Hour"),
        is_main_event,
        is_store_unlockable,
        has_limited_attendees,
        xp_to_buy: is_store_unlockable.then(|| page.text("XP to buy")),
        max_attendees: has_limited_attendees.then(|| page.number("Max Attendees") as i64),
        store_item_id: relation_id(page, "Store Item"),
        created_time: page.created_time.clone(),
        last_edited_time: page.last_edited_time.clone(),
    }
}

fn news_from_page(page: &Page) -> NewsPost {
    let publication_date = page.text("Publication Date");
    NewsPost {
        id: page.id.clone(),
        name: page.text("Name"),
        description: page.text("Description"),
        md_content: page.text("MD Content"),
        author: page.text("Author"),
        publication_date: (!publication_date.is_empty()).then_some(publication_date),
        created_time: page.created_time.clone(),
        last_edited_time: page.last_edited_time.clone(),
    }
}

fn relation_id(page: &Page, name: &str) -> Option<String> {
    match page.prop(name) {
        Some(Property::Relation { relation }) => relation.first().map(|r| r.id.clone()),
        _ => None,
    }
}

fn multi_select_names(page: &Page, name: &str) -> Vec<String> {
    match page.prop(name) {
        Some(Property::MultiSelect { multi_select }) => {
            multi_select.iter().map(|o| o.name.clone()).collect()
        }
        _ => Vec::new(),
    }
}

fn or_unknown(name: &str) -> String {
    if name.is_empty() {
        "Unknown User".to_string()
    } else {
        name.to_string()
    }
}

fn parse_json_array<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|err| {
        tracing::error!("Error parsing embedded JSON array: {}", err);
        Vec::new()
    })
}
