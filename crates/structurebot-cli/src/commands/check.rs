//! Check command handler: load corporation structures, evaluate them and
//! optionally notify Slack.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use structurebot_lib::{
    check_structures, Config, EsiClient, FuelPolicy, RetryPolicy, SlackNotifier, Structure,
    StructureStatus,
};

use crate::output::{CheckReport, OutputFormat};

/// Arguments for the check command.
#[derive(Debug, Clone)]
pub struct CheckCommandArgs {
    /// Corporation name; falls back to the configured one.
    pub corporation: Option<String>,
    /// Post findings to the configured Slack webhook.
    pub notify: bool,
    pub format: OutputFormat,
    /// Overrides the configured low-fuel horizon.
    pub fuel_warning_days: Option<i64>,
    /// Evaluate as of this instant instead of now.
    pub at: Option<DateTime<Utc>>,
}

/// Handle the check subcommand.
pub fn handle_check(config: &Config, args: &CheckCommandArgs) -> Result<()> {
    let corporation = args
        .corporation
        .clone()
        .or_else(|| config.corporation.clone())
        .ok_or_else(|| {
            anyhow!("no corporation given; pass --corporation or set STRUCTUREBOT_CORPORATION")
        })?;
    let credentials = config.sso.as_ref().ok_or_else(|| {
        anyhow!(
            "SSO credentials missing; set STRUCTUREBOT_SSO_CLIENT_ID, \
             STRUCTUREBOT_SSO_CLIENT_SECRET and STRUCTUREBOT_SSO_REFRESH_TOKEN"
        )
    })?;
    let notifier = match (&config.slack, args.notify) {
        (Some(slack), true) => Some(SlackNotifier::new(
            slack.webhook_url.clone(),
            slack.channel.clone(),
        )?),
        (None, true) => {
            return Err(anyhow!(
                "--notify requires STRUCTUREBOT_SLACK_WEBHOOK to be set"
            ))
        }
        (_, false) => None,
    };
    let policy = match args.fuel_warning_days {
        Some(days) => FuelPolicy::try_from_days(days)?,
        None => config.fuel_policy,
    };

    let registry = config
        .type_registry()
        .context("failed to load static data")?;
    let client = EsiClient::new(config.esi_url.clone(), RetryPolicy::default())?
        .authenticate(&config.login_url, credentials)
        .context("failed to obtain an ESI access token")?;

    let structures = Structure::from_corporation(&client, &registry, &corporation)
        .with_context(|| format!("failed to load structures for {corporation}"))?;

    let now = args.at.unwrap_or_else(Utc::now);

    let findings = check_structures(&structures, &registry, &policy, now)?;
    let statuses = structures
        .iter()
        .map(|structure| StructureStatus::evaluate(structure, &registry, &policy, now))
        .collect::<structurebot_lib::Result<Vec<_>>>()?;
    info!(
        corporation = %corporation,
        structures = statuses.len(),
        findings = findings.len(),
        "check complete"
    );

    let report = CheckReport {
        corporation,
        checked_at: now,
        structures: statuses,
        findings,
    };
    print!("{}", report.render(args.format)?);

    if let Some(notifier) = notifier {
        notifier
            .notify(&report.messages())
            .context("failed to post Slack notification")?;
    }
    Ok(())
}
