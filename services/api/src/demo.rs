use crate::infra::Portal;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use ensemble::clock::{Clock, ManualClock};
use ensemble::config::{SessionConfig, TurnoverSlaConfig, UpstreamConfig};
use ensemble::error::AppError;
use ensemble::registry::{
    Application, ApplicationId, AssetRegistry, Directory, HttpAssetRegistry, HttpDirectory,
    NewTeam, RegistryRepository, Team,
};
use ensemble::scorecard::{
    resolve_months, AvailabilityInput, NewScorecardEntry, TeamScorecard, TimePeriod, VolumeInput,
    YearMonth,
};
use ensemble::session::{Session, SessionManager, SsoAssertion};
use ensemble::store::{IdSource, InMemoryStore};
use ensemble::turnover::{NewTurnoverEntry, SectionDetails, SlaPolicy, TurnoverDashboard};
use std::fmt::Display;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct MonthsArgs {
    /// Time period: last-1, last-3, last-6, last-12, ytd or a four-digit year
    #[arg(long, default_value = "last-3", value_parser = crate::infra::parse_period)]
    pub(crate) period: TimePeriod,
    /// Override the reference date (defaults to today, UTC)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Scorecard period shown in the demo output
    #[arg(long, value_parser = crate::infra::parse_period)]
    pub(crate) period: Option<TimePeriod>,
    /// Skip the turnover portion of the demo
    #[arg(long)]
    pub(crate) skip_turnover: bool,
}

pub(crate) fn run_months(args: MonthsArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    println!("{} as of {}", args.period.label(), today);
    for slot in resolve_months(args.period, today) {
        let marker = if slot.is_future { " (future)" } else { "" };
        println!("- {}{}", slot.label, marker);
    }
    Ok(())
}

/// What the seeder created, for printing or logging.
pub(crate) struct DemoSeed {
    pub(crate) team: Team,
    pub(crate) session: Session,
    pub(crate) published: YearMonth,
}

fn seed_error(err: impl Display) -> AppError {
    AppError::Seed(err.to_string())
}

fn demo_assertion(groups: Vec<String>) -> SsoAssertion {
    SsoAssertion {
        first_name: "Dana".to_string(),
        last_name: "Operator".to_string(),
        email: "dana.operator@example.com".to_string(),
        ads_id: "doperator".to_string(),
        groups,
    }
}

/// Session settings for a throwaway portal; the key never leaves the process.
fn demo_session_config() -> SessionConfig {
    SessionConfig {
        secret: format!("ensemble-demo-session-key-{}", Utc::now().timestamp_micros()),
        sso_secret: format!("ensemble-demo-gateway-key-{}", Utc::now().timestamp_micros()),
        ttl_hours: 12,
        cookie_name: "ensemble_session".to_string(),
        secure_cookie: false,
    }
}

/// Portal over `store` driven by a manual clock, so seeded data can carry realistic ages.
pub(crate) fn demo_portal(
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
) -> Portal<HttpAssetRegistry, HttpDirectory> {
    let offline = UpstreamConfig {
        asset_api_url: None,
        ldap_api_url: None,
        timeout: std::time::Duration::from_secs(1),
    };
    Portal::new(
        store,
        Arc::new(SessionManager::new(&demo_session_config())),
        clock,
        (
            Arc::new(HttpAssetRegistry::new(&offline)),
            Arc::new(HttpDirectory::new(&offline)),
        ),
        SlaPolicy::from(&TurnoverSlaConfig::default()),
    )
}

/// Seeds one team with an application, three months of scorecard data, a
/// published month and a handful of turnover entries of different ages.
pub(crate) fn seed_demo_portal<A, D>(
    portal: &Portal<A, D>,
    clock: &ManualClock,
    now: DateTime<Utc>,
) -> Result<DemoSeed, AppError>
where
    A: AssetRegistry + 'static,
    D: Directory + 'static,
{
    clock.set(now - Duration::days(4));
    let sessions = &portal.context.sessions;

    let founder = sessions
        .establish(demo_assertion(Vec::new()), &[], clock.now())
        .map_err(seed_error)?;
    let team = portal
        .registry
        .create_team(
            &founder.session,
            NewTeam {
                name: "Payments Platform".to_string(),
                admin_group: "PAYMENTS-PLATFORM-ADMINS".to_string(),
                user_group: "PAYMENTS-PLATFORM-USERS".to_string(),
            },
        )
        .map_err(seed_error)?;

    let teams = portal.store.list_teams().map_err(seed_error)?;
    let session = sessions
        .establish(demo_assertion(vec![team.admin_group.clone()]), &teams, clock.now())
        .map_err(seed_error)?
        .session;

    let application = portal
        .store
        .insert_application(Application {
            id: ApplicationId(portal.store.next_id("app")),
            team_id: team.id.clone(),
            asset_id: "AST-4411".to_string(),
            name: "Card Authorisation Gateway".to_string(),
            tla: "CAG".to_string(),
            life_cycle_status: Some("Production".to_string()),
            tier: Some("1".to_string()),
            hierarchy: Vec::new(),
            synced_at: clock.now(),
            created_by: session.actor(),
            created_at: clock.now(),
        })
        .map_err(seed_error)?;

    let entry = portal
        .scorecard
        .create_entry(
            &session,
            &team.id,
            NewScorecardEntry {
                application_id: application.id.clone(),
                scorecard_identifier: "CAG-AUTH".to_string(),
                name: "Authorisation API".to_string(),
                availability_threshold: 99.5,
                volume_change_threshold: 15.0,
            },
        )
        .map_err(seed_error)?;

    let samples = [
        (99.92, 1_204_000, None),
        (99.31, 1_498_500, Some("Failover drill overran")),
        (99.87, 1_512_250, None),
    ];
    let months = resolve_months(TimePeriod::Last3Months, now.date_naive());
    for (month, (availability, volume, reason)) in months.iter().zip(samples) {
        portal
            .scorecard
            .upsert_availability(
                &session,
                &entry.id,
                AvailabilityInput {
                    year: month.year,
                    month: month.month,
                    availability,
                    reason: reason.map(str::to_string),
                },
            )
            .map_err(seed_error)?;
        portal
            .scorecard
            .upsert_volume(
                &session,
                &entry.id,
                VolumeInput {
                    year: month.year,
                    month: month.month,
                    volume,
                    reason: None,
                },
            )
            .map_err(seed_error)?;
    }

    let published = YearMonth::of(now.date_naive()).previous();
    portal
        .scorecard
        .publish_month(&session, &team.id, published.year, published.month)
        .map_err(seed_error)?;

    let turnover = [
        (
            SectionDetails::Inc {
                incident_number: "INC0042117".to_string(),
            },
            "Intermittent 502s from the issuer gateway",
            true,
        ),
        (
            SectionDetails::Rfc {
                rfc_number: "CHG0031988".to_string(),
                rfc_status: "Scheduled".to_string(),
                validated_by: None,
            },
            "TLS certificate rotation on the edge pool",
            false,
        ),
        (SectionDetails::Fyi, "Vendor maintenance window this weekend", false),
    ];
    for (index, (details, description, is_important)) in turnover.into_iter().enumerate() {
        clock.set(now - Duration::hours(80 - 30 * index as i64));
        portal
            .turnover
            .create(
                &session,
                &team.id,
                NewTurnoverEntry {
                    application_id: application.id.clone(),
                    details,
                    description: description.to_string(),
                    comments: None,
                    is_important,
                },
            )
            .map_err(seed_error)?;
    }

    clock.set(now);
    Ok(DemoSeed {
        team,
        session,
        published,
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        skip_turnover,
    } = args;

    let now = Utc::now();
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(now));
    let portal = demo_portal(store, clock.clone());
    let seed = seed_demo_portal(&portal, &clock, now)?;

    println!("Ensemble demo for team '{}'", seed.team.name);
    let scorecard = portal
        .scorecard
        .team_scorecard(
            &seed.session,
            &seed.team.id,
            period.unwrap_or_default(),
            now.date_naive(),
        )
        .map_err(seed_error)?;
    render_scorecard(&scorecard);
    println!("Published month: {}", seed.published.label());

    if skip_turnover {
        return Ok(());
    }

    let dashboard = portal
        .turnover
        .dashboard(&seed.session, &seed.team.id)
        .map_err(seed_error)?;
    render_dashboard(&dashboard);

    let views = portal
        .turnover
        .list(&seed.session, &seed.team.id, Default::default())
        .map_err(seed_error)?;
    println!("\nTurnover log");
    for view in views {
        let flag = if view.entry.is_important { "!" } else { " " };
        println!(
            "{} [{}] {} {} ({})",
            flag,
            view.entry.section(),
            view.tla,
            view.entry.description,
            view.sla.label()
        );
    }

    Ok(())
}

fn render_scorecard(scorecard: &TeamScorecard) {
    println!("\nScorecard ({})", scorecard.period_label);
    for entry in &scorecard.entries {
        println!(
            "- {} / {} (threshold {:.2}%, volume change {:.1}%)",
            entry.tla,
            entry.entry.name,
            entry.evaluation.thresholds.availability_threshold,
            entry.evaluation.thresholds.volume_change_threshold
        );
        for month in &entry.evaluation.months {
            let availability = month
                .availability
                .map(|value| format!("{value:.2}%"))
                .unwrap_or_else(|| "-".to_string());
            let volume = month
                .volume
                .map(|value| value.to_string())
                .unwrap_or_else(|| "-".to_string());
            let change = month
                .volume_change
                .map(|value| format!(" ({value:+.1}%)"))
                .unwrap_or_default();
            let breach = if month.availability_breach || month.volume_breach {
                " BREACH"
            } else {
                ""
            };
            println!(
                "    {}: availability {} | volume {}{}{}",
                month.label, availability, volume, change, breach
            );
        }
    }
    for publication in &scorecard.publication {
        if publication.published {
            let pending = if publication.pending_changes {
                " with pending changes"
            } else {
                ""
            };
            println!("  {} published{}", publication.label, pending);
        }
    }
}

fn render_dashboard(dashboard: &TurnoverDashboard) {
    println!(
        "\nTurnover dashboard: {} open, {} important",
        dashboard.open, dashboard.important
    );
    for summary in &dashboard.sections {
        if summary.open == 0 {
            continue;
        }
        println!(
            "- {}: {} open | overdue {} | at risk {} | unattended {} | stale {} | healthy {}",
            summary.section,
            summary.open,
            summary.sla.overdue,
            summary.sla.at_risk,
            summary.sla.unattended,
            summary.sla.stale,
            summary.sla.healthy
        );
    }
}
