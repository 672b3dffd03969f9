//! Access service - ties together entitlement reads, evaluation,
//! capability tokens and the admin operations that change entitlements

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use lectern_db::{
    CourseRepository, CreateDemoGrant, CreateEnrollment, CreateResource, CreateSubscription,
    CreateUser, DemoGrantRepository, EnrollmentRepository, Repositories, SnapshotRepository,
    StatusChange, SubscriptionRepository, UserRepository,
};
use lectern_types::{
    AccessDecision, AccessType, Capability, CapabilitySet, Countdown, CourseId, CourseResource,
    DemoGrant, DemoGrantId, DenialReason, Enrollment, EnrollmentId, EnrollmentKind,
    EntitlementSnapshot, GuestId, Plan, ResourceId, Role, Subscription, SubscriptionId,
    SubscriptionStatus, UserId,
};

use crate::{
    capability_token::{CapabilitySigner, GuestDemoClaims, PlayClaims, PlaySubject},
    clock::{Clock, SystemClock},
    config::AccessConfig,
    evaluator::{evaluate, pick_demo_resource, Subject},
    token::VerifiedUser,
    AccessError,
};

/// Maximum length of a resource title, in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Repositories the access service reads and writes
#[derive(Clone)]
pub struct AccessStores {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub demo_grants: Arc<dyn DemoGrantRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl From<Repositories> for AccessStores {
    fn from(repos: Repositories) -> Self {
        Self {
            users: Arc::new(repos.users),
            courses: Arc::new(repos.courses),
            enrollments: Arc::new(repos.enrollments),
            demo_grants: Arc::new(repos.demo_grants),
            subscriptions: Arc::new(repos.subscriptions),
            snapshots: Arc::new(repos.snapshots),
        }
    }
}

/// Permission to play or book one resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub resource: CourseResource,
    pub decision: AccessDecision,
}

/// State of a caller's demo window for one course and access type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStatus {
    pub course_id: CourseId,
    pub access_type: AccessType,
    /// A window exists (running or expired)
    pub started: bool,
    pub expired: bool,
    pub resource_id: Option<ResourceId>,
    pub granted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub countdown: Option<Countdown>,
}

impl DemoStatus {
    fn not_started(course_id: CourseId, access_type: AccessType) -> Self {
        Self {
            course_id,
            access_type,
            started: false,
            expired: false,
            resource_id: None,
            granted_at: None,
            expires_at: None,
            countdown: None,
        }
    }

    fn window(
        course_id: CourseId,
        access_type: AccessType,
        resource_id: Option<ResourceId>,
        granted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            course_id,
            access_type,
            started: true,
            expired: lectern_types::is_expired(expires_at, now),
            resource_id,
            granted_at: Some(granted_at),
            expires_at: Some(expires_at),
            countdown: Some(Countdown::until(expires_at, now)),
        }
    }
}

/// Result of starting a demo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStart {
    #[serde(flatten)]
    pub status: DemoStatus,
    /// False when an existing window was returned
    pub created: bool,
    /// Signed token a guest must send back in `X-Guest-Demo`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_token: Option<String>,
}

/// Fail unless `caps` contains `cap`
pub fn require_capability(caps: CapabilitySet, cap: Capability) -> Result<(), AccessError> {
    if caps.has(cap) {
        Ok(())
    } else {
        Err(AccessError::Forbidden(format!("missing capability {cap:?}")))
    }
}

/// Access service
///
/// Provides a unified interface for:
/// - Entitlement decisions and play tokens
/// - Demo windows for students and guests
/// - Enrollment, subscription, role and resource administration
pub struct AccessService {
    config: AccessConfig,
    stores: AccessStores,
    signer: CapabilitySigner,
    clock: Arc<dyn Clock>,
    /// Cache of user_id -> role
    role_cache: Cache<UserId, Role>,
}

impl AccessService {
    /// Create a new access service using the system clock
    pub fn new(config: AccessConfig, stores: AccessStores) -> Result<Self, AccessError> {
        Self::with_clock(config, stores, Arc::new(SystemClock))
    }

    /// Create a new access service with a custom clock
    pub fn with_clock(
        config: AccessConfig,
        stores: AccessStores,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AccessError> {
        let signer = CapabilitySigner::new(&config.capability_secret)
            .map_err(|e| AccessError::Configuration(e.to_string()))?;

        Ok(Self {
            role_cache: Cache::builder()
                .time_to_live(config.role_cache_ttl)
                .max_capacity(10_000)
                .build(),
            config,
            stores,
            signer,
            clock,
        })
    }

    /// Current time from the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Capability token signer
    pub fn signer(&self) -> &CapabilitySigner {
        &self.signer
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Resolve a verified user's role, recording the user on first sight
    pub async fn resolve_role(&self, user: &VerifiedUser) -> Result<Role, AccessError> {
        if let Some(role) = self.role_cache.get(&user.user_id).await {
            return Ok(role);
        }

        let row = match self.stores.users.find_by_id(user.user_id.0).await? {
            Some(row) => row,
            None => {
                let email = user
                    .email
                    .clone()
                    .unwrap_or_else(|| format!("{}@users.lectern.invalid", user.user_id));
                tracing::info!(user_id = %user.user_id, "Recording new user");
                self.stores
                    .users
                    .ensure(CreateUser {
                        id: user.user_id.0,
                        email,
                    })
                    .await?
            }
        };

        let role = row.role();
        self.role_cache.insert(user.user_id, role).await;
        Ok(role)
    }

    /// Change a user's role on behalf of a caller holding `actor`.
    ///
    /// Promotions to and demotions from superadmin need
    /// [`Capability::ManageSuperadmins`].
    pub async fn set_role(
        &self,
        actor: CapabilitySet,
        user_id: UserId,
        role: Role,
    ) -> Result<(), AccessError> {
        let current = self
            .stores
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(AccessError::NotFound("user"))?
            .role();
        if current == Role::SuperAdmin || role == Role::SuperAdmin {
            require_capability(actor, Capability::ManageSuperadmins)?;
        }

        self.stores
            .users
            .update_role(user_id.0, role.as_str())
            .await
            .map_err(|e| match e {
                lectern_db::DbError::NotFound => AccessError::NotFound("user"),
                other => other.into(),
            })?;

        self.role_cache.invalidate(&user_id).await;
        tracing::info!(user_id = %user_id, from = %current, to = %role, "Role changed");
        Ok(())
    }

    // =========================================================================
    // Entitlement decisions
    // =========================================================================

    /// Decide what `subject` may open in a course.
    ///
    /// Never fails: if the entitlement reads error or exceed the lookup
    /// timeout the decision is a denial with [`DenialReason::Unavailable`].
    pub async fn check_access(
        &self,
        subject: &Subject,
        course_id: CourseId,
        access_type: AccessType,
    ) -> AccessDecision {
        let start = Instant::now();

        let loaded = tokio::time::timeout(
            self.config.lookup_timeout,
            self.load_inputs(subject, course_id, access_type),
        )
        .await;

        let decision = match loaded {
            Ok(Ok((snapshot, resources))) => evaluate(
                subject,
                &snapshot,
                course_id,
                access_type,
                &resources,
                self.clock.now(),
            ),
            Ok(Err(e)) => {
                tracing::warn!(course_id = %course_id, error = %e, "Entitlement lookup failed");
                AccessDecision::denied(course_id, access_type, DenialReason::Unavailable)
            }
            Err(_) => {
                tracing::warn!(
                    course_id = %course_id,
                    timeout_secs = self.config.lookup_timeout.as_secs(),
                    "Entitlement lookup timed out"
                );
                AccessDecision::denied(course_id, access_type, DenialReason::Unavailable)
            }
        };

        metrics::counter!(
            "lectern_access_decisions_total",
            "tier" => decision.tier.as_str(),
            "allowed" => if decision.allowed { "true" } else { "false" }
        )
        .increment(1);
        metrics::histogram!("lectern_operation_duration_seconds", "operation" => "check_access")
            .record(start.elapsed().as_secs_f64());

        tracing::debug!(
            course_id = %course_id,
            access_type = %access_type,
            tier = %decision.tier,
            allowed = decision.allowed,
            "Access evaluated"
        );
        decision
    }

    async fn load_inputs(
        &self,
        subject: &Subject,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<(EntitlementSnapshot, Vec<CourseResource>), AccessError> {
        let (snapshot, resources) = tokio::try_join!(
            self.load_snapshot(subject, course_id, access_type),
            self.load_resources(course_id, access_type)
        )?;
        Ok((snapshot, resources))
    }

    /// Staff and guests need no entitlement rows
    async fn load_snapshot(
        &self,
        subject: &Subject,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<EntitlementSnapshot, AccessError> {
        match subject {
            Subject::User { user_id, role } if !role.is_staff() => {
                let rows = self
                    .stores
                    .snapshots
                    .load_snapshot(user_id.0, course_id.0, access_type.as_str())
                    .await?;
                Ok(EntitlementSnapshot::try_from(rows)?)
            }
            _ => Ok(EntitlementSnapshot::default()),
        }
    }

    async fn load_resources(
        &self,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<Vec<CourseResource>, AccessError> {
        let rows = self
            .stores
            .courses
            .list_resources(course_id.0, access_type.as_str())
            .await?;
        let mut resources = rows
            .into_iter()
            .map(CourseResource::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        lectern_types::sort_chronologically(&mut resources);
        Ok(resources)
    }

    /// Authorize playing (or booking) one resource and issue a play token
    pub async fn authorize_resource(
        &self,
        subject: &Subject,
        course_id: CourseId,
        resource_id: ResourceId,
    ) -> Result<PlayGrant, AccessError> {
        let resource = self
            .stores
            .courses
            .find_resource(resource_id.0)
            .await?
            .map(CourseResource::try_from)
            .transpose()?
            .filter(|r| r.course_id == course_id)
            .ok_or(AccessError::NotFound("resource"))?;

        let decision = self
            .check_access(subject, course_id, resource.access_type)
            .await;

        if !decision.allowed {
            return Err(AccessError::Denied(
                decision.denial.unwrap_or(DenialReason::ResourceLocked),
            ));
        }
        if !decision.can_access(resource_id) {
            return Err(AccessError::Denied(DenialReason::ResourceLocked));
        }

        let play_subject = match subject {
            Subject::User { user_id, .. } => PlaySubject::User(*user_id),
            Subject::Guest { demo: Some(claims) } => PlaySubject::Guest(claims.guest_id),
            Subject::Guest { demo: None } => {
                return Err(AccessError::Denied(DenialReason::SignUpRequired))
            }
        };

        let now = self.clock.now();
        let expires_at = now + self.config.play_token_ttl_chrono();
        let token = self.signer.issue_play(PlayClaims {
            subject: play_subject,
            course_id,
            resource_id,
            access_type: resource.access_type,
            issued_at: now,
            expires_at,
        })?;

        tracing::info!(
            course_id = %course_id,
            resource_id = %resource_id,
            tier = %decision.tier,
            "Play token issued"
        );

        Ok(PlayGrant {
            token,
            expires_at,
            resource,
            decision,
        })
    }

    /// Verify a play token presented by the media proxy
    pub fn verify_play_token(&self, token: &str) -> Result<PlayClaims, AccessError> {
        Ok(self.signer.verify_play(token, self.clock.now())?)
    }

    // =========================================================================
    // Demo windows
    // =========================================================================

    /// Start (or return) a student's demo for a course and access type.
    ///
    /// Creates the demo enrollment if the student has none. Students who
    /// already have full access are rejected.
    pub async fn start_demo(
        &self,
        user_id: UserId,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<DemoStart, AccessError> {
        self.require_course(course_id).await?;

        let now = self.clock.now();
        let snapshot = EntitlementSnapshot::try_from(
            self.stores
                .snapshots
                .load_snapshot(user_id.0, course_id.0, access_type.as_str())
                .await?,
        )?;
        let paid = snapshot.enrollment.as_ref().is_some_and(Enrollment::is_paid);
        let subscribed = snapshot.subscription.as_ref().is_some_and(|s| s.is_active(now));
        if paid || subscribed {
            return Err(AccessError::AlreadyEntitled);
        }

        let (grant, created) = self.open_grant(user_id, course_id, access_type, None, now).await?;
        let resources = self.load_resources(course_id, access_type).await?;

        Ok(DemoStart {
            status: grant_status(&grant, &resources, now),
            created,
            guest_token: None,
        })
    }

    /// Start (or return) a guest's demo.
    ///
    /// A valid token for the same course and access type is handed back
    /// unchanged, so the window does not reset.
    pub async fn start_guest_demo(
        &self,
        existing_token: Option<&str>,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<DemoStart, AccessError> {
        let now = self.clock.now();

        if let Some(token) = existing_token {
            match self.signer.verify_guest_demo(token) {
                Ok(claims) if claims.covers(course_id, access_type) => {
                    return Ok(DemoStart {
                        status: claims_status(&claims, now),
                        created: false,
                        guest_token: Some(token.to_string()),
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "Ignoring invalid guest demo token"),
            }
        }

        self.require_course(course_id).await?;
        let resources = self.load_resources(course_id, access_type).await?;
        // The token pins its resource for the whole window
        let resource_id =
            pick_demo_resource(None, &resources).ok_or(AccessError::NotFound("resource"))?;

        let claims = GuestDemoClaims {
            guest_id: GuestId::new(),
            course_id,
            access_type,
            resource_id: Some(resource_id),
            granted_at: now,
            expires_at: now + self.config.demo_window_chrono(),
        };
        let token = self.signer.issue_guest_demo(claims.clone())?;

        metrics::counter!("lectern_demo_grants_created_total", "subject" => "guest").increment(1);
        tracing::info!(
            guest_id = %claims.guest_id,
            course_id = %course_id,
            access_type = %access_type,
            "Guest demo started"
        );

        Ok(DemoStart {
            status: claims_status(&claims, now),
            created: true,
            guest_token: Some(token),
        })
    }

    /// Current demo window of a subject
    pub async fn demo_status(
        &self,
        subject: &Subject,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<DemoStatus, AccessError> {
        let now = self.clock.now();

        match subject {
            Subject::User { user_id, .. } => {
                let grant = self
                    .stores
                    .demo_grants
                    .find_for(user_id.0, course_id.0, access_type.as_str())
                    .await?
                    .map(DemoGrant::try_from)
                    .transpose()?;

                match grant {
                    Some(grant) => {
                        let resources = self.load_resources(course_id, access_type).await?;
                        Ok(grant_status(&grant, &resources, now))
                    }
                    None => Ok(DemoStatus::not_started(course_id, access_type)),
                }
            }
            Subject::Guest { demo: Some(claims) } if claims.covers(course_id, access_type) => {
                Ok(claims_status(claims, now))
            }
            Subject::Guest { .. } => Ok(DemoStatus::not_started(course_id, access_type)),
        }
    }

    /// Admin grant of a demo to a student, optionally pinned to a resource
    pub async fn grant_demo(
        &self,
        user_id: UserId,
        course_id: CourseId,
        access_type: AccessType,
        resource_id: Option<ResourceId>,
    ) -> Result<DemoStart, AccessError> {
        self.require_course(course_id).await?;
        if self.stores.users.find_by_id(user_id.0).await?.is_none() {
            return Err(AccessError::NotFound("user"));
        }
        if let Some(resource_id) = resource_id {
            self.require_resource_of(resource_id, course_id, access_type)
                .await?;
        }

        let now = self.clock.now();
        let (mut grant, created) = self
            .open_grant(user_id, course_id, access_type, resource_id, now)
            .await?;

        // An existing window keeps its expiry but takes the requested pin
        if let Some(resource_id) = resource_id.filter(|id| grant.resource_id != Some(*id)) {
            let row = self
                .stores
                .demo_grants
                .set_resource(grant.id.0, resource_id.0)
                .await?;
            grant = DemoGrant::try_from(row)?;
            tracing::info!(grant_id = %grant.id, resource_id = %resource_id, "Demo resource pinned on existing grant");
        }

        let resources = self.load_resources(course_id, access_type).await?;

        Ok(DemoStart {
            status: grant_status(&grant, &resources, now),
            created,
            guest_token: None,
        })
    }

    async fn open_grant(
        &self,
        user_id: UserId,
        course_id: CourseId,
        access_type: AccessType,
        resource_id: Option<ResourceId>,
        now: DateTime<Utc>,
    ) -> Result<(DemoGrant, bool), AccessError> {
        let (row, created) = self
            .stores
            .demo_grants
            .start(CreateDemoGrant {
                id: DemoGrantId::new().0,
                user_id: user_id.0,
                course_id: course_id.0,
                access_type,
                resource_id: resource_id.map(|id| id.0),
                granted_at: now,
                expires_at: now + self.config.demo_window_chrono(),
            })
            .await?;
        let grant = DemoGrant::try_from(row)?;

        if created {
            metrics::counter!("lectern_demo_grants_created_total", "subject" => "user")
                .increment(1);
            tracing::info!(
                user_id = %user_id,
                course_id = %course_id,
                access_type = %access_type,
                expires_at = %grant.expires_at,
                "Demo started"
            );
        }
        Ok((grant, created))
    }

    /// Delete a demo grant
    pub async fn revoke_demo(&self, grant_id: DemoGrantId) -> Result<(), AccessError> {
        if !self.stores.demo_grants.delete(grant_id.0).await? {
            return Err(AccessError::NotFound("demo grant"));
        }
        tracing::info!(grant_id = %grant_id, "Demo grant revoked");
        Ok(())
    }

    /// Pin the resource a demo grant unlocks
    pub async fn pin_demo_resource(
        &self,
        grant_id: DemoGrantId,
        resource_id: ResourceId,
    ) -> Result<DemoGrant, AccessError> {
        let grant = self
            .stores
            .demo_grants
            .find_by_id(grant_id.0)
            .await?
            .map(DemoGrant::try_from)
            .transpose()?
            .ok_or(AccessError::NotFound("demo grant"))?;

        self.require_resource_of(resource_id, grant.course_id, grant.access_type)
            .await?;

        let row = self
            .stores
            .demo_grants
            .set_resource(grant_id.0, resource_id.0)
            .await?;
        tracing::info!(grant_id = %grant_id, resource_id = %resource_id, "Demo resource pinned");
        Ok(DemoGrant::try_from(row)?)
    }

    /// All demo grants of a course, newest first
    pub async fn list_demo_grants(&self, course_id: CourseId) -> Result<Vec<DemoGrant>, AccessError> {
        let rows = self.stores.demo_grants.list_by_course(course_id.0).await?;
        Ok(rows
            .into_iter()
            .map(DemoGrant::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    // =========================================================================
    // Enrollments and subscriptions
    // =========================================================================

    /// Enroll a student. A paid enrollment supersedes any demo state.
    pub async fn enroll(
        &self,
        student_id: UserId,
        course_id: CourseId,
        kind: EnrollmentKind,
    ) -> Result<Enrollment, AccessError> {
        self.require_course(course_id).await?;
        if self.stores.users.find_by_id(student_id.0).await?.is_none() {
            return Err(AccessError::NotFound("user"));
        }

        let row = self
            .stores
            .enrollments
            .enroll(CreateEnrollment {
                id: EnrollmentId::new().0,
                student_id: student_id.0,
                course_id: course_id.0,
                kind,
            })
            .await?;
        let enrollment = Enrollment::try_from(row)?;

        tracing::info!(
            student_id = %student_id,
            course_id = %course_id,
            kind = %enrollment.kind,
            "Enrollment recorded"
        );
        Ok(enrollment)
    }

    /// Record a checkout as a subscription awaiting approval
    pub async fn request_subscription(
        &self,
        student_id: UserId,
        course_id: CourseId,
        plan: Plan,
    ) -> Result<Subscription, AccessError> {
        self.require_course(course_id).await?;

        let price_cents = plan.price_cents();
        if price_cents <= 0 {
            return Err(AccessError::Validation(format!(
                "plan {plan} has no valid price"
            )));
        }

        let row = self
            .stores
            .subscriptions
            .create(CreateSubscription {
                id: SubscriptionId::new().0,
                student_id: student_id.0,
                course_id: course_id.0,
                plan,
                price_cents,
            })
            .await?;

        tracing::info!(student_id = %student_id, course_id = %course_id, plan = %plan, "Subscription requested");
        Ok(Subscription::try_from(row)?)
    }

    /// Approve a pending subscription; the period starts now
    pub async fn approve_subscription(&self, id: SubscriptionId) -> Result<Subscription, AccessError> {
        let now = self.clock.now();
        self.transition_subscription(id, SubscriptionStatus::Active, |sub| {
            Some((now, now + sub.plan.duration()))
        })
        .await
    }

    /// Reject a pending subscription
    pub async fn reject_subscription(&self, id: SubscriptionId) -> Result<Subscription, AccessError> {
        self.transition_subscription(id, SubscriptionStatus::Rejected, |_| None)
            .await
    }

    /// Expire an active subscription now
    pub async fn expire_subscription(&self, id: SubscriptionId) -> Result<Subscription, AccessError> {
        let now = self.clock.now();
        self.transition_subscription(id, SubscriptionStatus::Expired, |sub| {
            let start = sub.starts_at.unwrap_or(now);
            let end = sub.expires_at.map_or(now, |end| end.min(now));
            Some((start, end))
        })
        .await
    }

    async fn transition_subscription(
        &self,
        id: SubscriptionId,
        to: SubscriptionStatus,
        period: impl FnOnce(&Subscription) -> Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Subscription, AccessError> {
        let current = self
            .stores
            .subscriptions
            .find_by_id(id.0)
            .await?
            .map(Subscription::try_from)
            .transpose()?
            .ok_or(AccessError::NotFound("subscription"))?;

        current.check_transition(to)?;

        let row = self
            .stores
            .subscriptions
            .transition(StatusChange {
                id: id.0,
                from: current.status,
                to,
                period: period(&current),
            })
            .await?;

        tracing::info!(subscription_id = %id, from = %current.status, to = %to, "Subscription status changed");
        Ok(Subscription::try_from(row)?)
    }

    /// A student's subscriptions, newest first
    pub async fn list_subscriptions(&self, student_id: UserId) -> Result<Vec<Subscription>, AccessError> {
        let rows = self.stores.subscriptions.list_by_student(student_id.0).await?;
        Ok(rows
            .into_iter()
            .map(Subscription::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Add a lecture recording or live class to a course
    pub async fn add_resource(
        &self,
        course_id: CourseId,
        access_type: AccessType,
        title: &str,
    ) -> Result<CourseResource, AccessError> {
        let title = validate_title(title)?;
        self.require_course(course_id).await?;

        let row = self
            .stores
            .courses
            .create_resource(CreateResource {
                id: ResourceId::new().0,
                course_id: course_id.0,
                access_type,
                title,
            })
            .await?;
        let resource = CourseResource::try_from(row)?;

        tracing::info!(course_id = %course_id, resource_id = %resource.id, access_type = %access_type, "Resource added");
        Ok(resource)
    }

    /// A course's resources of one type, oldest first
    pub async fn list_resources(
        &self,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<Vec<CourseResource>, AccessError> {
        self.require_course(course_id).await?;
        self.load_resources(course_id, access_type).await
    }

    async fn require_course(&self, course_id: CourseId) -> Result<(), AccessError> {
        match self.stores.courses.find_course(course_id.0).await? {
            Some(_) => Ok(()),
            None => Err(AccessError::NotFound("course")),
        }
    }

    async fn require_resource_of(
        &self,
        resource_id: ResourceId,
        course_id: CourseId,
        access_type: AccessType,
    ) -> Result<CourseResource, AccessError> {
        let resource = self
            .stores
            .courses
            .find_resource(resource_id.0)
            .await?
            .map(CourseResource::try_from)
            .transpose()?
            .ok_or(AccessError::NotFound("resource"))?;

        if resource.course_id != course_id || resource.access_type != access_type {
            return Err(AccessError::Validation(format!(
                "resource {resource_id} is not a {access_type} of course {course_id}"
            )));
        }
        Ok(resource)
    }
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService")
            .field("demo_window", &self.config.demo_window)
            .field("lookup_timeout", &self.config.lookup_timeout)
            .finish_non_exhaustive()
    }
}

fn grant_status(grant: &DemoGrant, resources: &[CourseResource], now: DateTime<Utc>) -> DemoStatus {
    DemoStatus::window(
        grant.course_id,
        grant.access_type,
        pick_demo_resource(grant.resource_id, resources),
        grant.granted_at,
        grant.expires_at,
        now,
    )
}

fn claims_status(claims: &GuestDemoClaims, now: DateTime<Utc>) -> DemoStatus {
    DemoStatus::window(
        claims.course_id,
        claims.access_type,
        claims.resource_id,
        claims.granted_at,
        claims.expires_at,
        now,
    )
}

/// Trim a resource title and check it is non-empty and short enough
pub fn validate_title(title: &str) -> Result<String, AccessError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AccessError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AccessError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}
