//! Command execution: wires configuration, transport and the engine together
//! and prints operator-facing output.

use crate::batch::{prepare_payloads, BatchExecutor, BatchOutcome, ItemReport, Lifecycle};
use crate::classify::CameraHealth;
use crate::cli::{Commands, RangeArgs};
use crate::config::{AppConfig, ServerProfile};
use crate::desired::{load_csv, CameraRange, Credentials, DesiredStreamSpec, StreamKind};
use crate::diagnostics::{server_summary, stream_detail};
use crate::error::{Error, Result};
use crate::export::{in_zone, primary_sheet, write_created, write_sheet_file};
use crate::identity::IdGenerator;
use crate::inventory::fetch_all;
use crate::models::RemoteStream;
use crate::reconcile::reconcile;
use crate::transport::{HttpTransport, Transport};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything one command invocation needs against one server.
pub struct Session {
    config: AppConfig,
    profile: ServerProfile,
    ids: IdGenerator,
    transport: Box<dyn Transport>,
}

impl Session {
    pub fn new(config: AppConfig, profile: ServerProfile) -> Result<Self> {
        let transport = HttpTransport::new(&profile, config.timeout)?;
        Ok(Self::with_transport(config, profile, Box::new(transport)))
    }

    pub fn with_transport(
        config: AppConfig,
        profile: ServerProfile,
        transport: Box<dyn Transport>,
    ) -> Self {
        let ids = IdGenerator::new(config.secret_key.clone());
        Self {
            config,
            profile,
            ids,
            transport,
        }
    }

    pub fn profile(&self) -> &ServerProfile {
        &self.profile
    }

    async fn inventory(&self) -> Result<Vec<RemoteStream>> {
        fetch_all(self.transport.as_ref(), self.config.page_size).await
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        tracing::info!("Profile {} ({})", self.profile.name, self.profile.api_url);
        match command {
            Commands::Create { kind, csv } => self.create_from_csv(kind.into(), csv).await,
            Commands::CreateRange(range) => self.create_range(range).await,
            Commands::StartAll => self.lifecycle_all(Lifecycle::Start).await,
            Commands::StopAll => self.lifecycle_all(Lifecycle::Stop).await,
            Commands::DeleteAll { prefix, yes } => self.delete(prefix.as_deref(), yes).await,
            Commands::Query => self.query().await,
            Commands::QueryStream { stream_id } => self.query_stream(&stream_id).await,
            Commands::Export { zone, output } => self.export(&zone, output).await,
            Commands::RtspUrls => self.rtsp_urls().await,
            Commands::Profiles | Commands::DeriveId { .. } => {
                Err(Error::invalid("command does not need a server session"))
            }
        }
    }

    async fn create_from_csv(&self, kind: StreamKind, csv: Option<PathBuf>) -> Result<()> {
        let path = csv.or_else(|| self.profile.streams_csv.clone()).ok_or_else(|| {
            Error::Config(format!(
                "profile '{}' has no streams_csv; pass --csv",
                self.profile.name
            ))
        })?;
        let desired = load_csv(&path, &self.profile)?;
        self.create(desired, kind).await.map(|_| ())
    }

    async fn create_range(&self, args: RangeArgs) -> Result<()> {
        let range = CameraRange {
            zone: args.zone,
            subnet: args.subnet,
            start: args.start,
            end: args.end,
            credentials: Credentials {
                username: args.username,
                password: args.password,
            },
            backup: args.backup,
        };
        let desired = range.specs(&self.profile)?;
        // Fail on an unwritable output before anything is created.
        let output = std::fs::File::create(&args.output)?;
        let created = self.create(desired, StreamKind::IpCamera).await?;

        write_created(output, &created)?;
        println!("Wrote {} row(s) to {}", created.len(), args.output.display());
        Ok(())
    }

    /// Reconcile and create; returns `(name, streamId)` of each created stream.
    async fn create(
        &self,
        desired: Vec<DesiredStreamSpec>,
        kind: StreamKind,
    ) -> Result<Vec<(String, String)>> {
        let inventory = self.inventory().await?;
        let plan = reconcile(desired, &inventory, &self.ids)?;
        for stream_id in &plan.to_skip {
            println!("streamId {} already exists, skipping...", stream_id);
        }
        let payloads = prepare_payloads(&plan.to_create, kind)?;

        let mut created = Vec::new();
        let outcome = BatchExecutor::new(self.transport.as_ref())
            .create(&payloads, &mut |report: &ItemReport| {
                print_item(report);
                if report.verdict.success {
                    created.push((
                        report.name.clone().unwrap_or_default(),
                        report.stream_id.clone(),
                    ));
                }
            })
            .await;

        print_outcome(&outcome, plan.to_skip.len());
        Ok(created)
    }

    async fn lifecycle_all(&self, op: Lifecycle) -> Result<()> {
        let inventory = self.inventory().await?;
        let targets: Vec<String> = inventory.into_iter().map(|s| s.stream_id).collect();
        let outcome = BatchExecutor::new(self.transport.as_ref())
            .apply(op, &targets, &mut print_item)
            .await;
        print_outcome(&outcome, 0);
        Ok(())
    }

    async fn delete(&self, prefix: Option<&str>, confirmed: bool) -> Result<()> {
        let inventory = self.inventory().await?;
        let targets: Vec<String> = match prefix {
            Some(prefix) => in_zone(&inventory, prefix)
                .into_iter()
                .map(|s| s.stream_id.clone())
                .collect(),
            None => inventory.into_iter().map(|s| s.stream_id).collect(),
        };

        if targets.is_empty() {
            println!("No matching streams.");
            return Ok(());
        }
        if !confirmed {
            println!("{} stream(s) would be deleted:", targets.len());
            for id in &targets {
                println!("  {}", id);
            }
            println!("Re-run with --yes to delete them.");
            return Ok(());
        }

        let outcome = BatchExecutor::new(self.transport.as_ref())
            .apply(Lifecycle::Delete, &targets, &mut print_item)
            .await;
        print_outcome(&outcome, 0);
        Ok(())
    }

    async fn query(&self) -> Result<()> {
        let inventory = self.inventory().await?;
        let summary = server_summary(self.transport.as_ref(), &inventory).await;

        if let Some(v) = &summary.version {
            println!(
                "Version: {} ({}) Build: {}",
                v.version_name.as_deref().unwrap_or("N/A"),
                v.version_type.as_deref().unwrap_or("N/A"),
                v.build_number.as_deref().unwrap_or("N/A")
            );
        }
        match summary.active_live_streams {
            Some(active) => println!("Active live streams: {} / total: {}", active, summary.total),
            None => println!("Total streams: {}", summary.total),
        }
        if inventory.is_empty() {
            println!("No streams on this server.");
            return Ok(());
        }

        println!("Status: {:?}", summary.by_status);
        println!("Type: {:?}", summary.by_type);
        println!();
        println!("{:<50} {:<20} {:<15} {:<15}", "streamId", "name", "type", "status");
        println!("{}", "-".repeat(100));
        for s in &inventory {
            println!(
                "{:<50} {:<20} {:<15} {:<15}",
                s.stream_id,
                s.name,
                s.type_or_unknown(),
                s.status.as_deref().unwrap_or("N/A")
            );
        }
        Ok(())
    }

    async fn query_stream(&self, stream_id: &str) -> Result<()> {
        let detail = match stream_detail(self.transport.as_ref(), stream_id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                println!("Stream {} does not exist.", stream_id);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Lookup of {} failed: {}", stream_id, e);
                println!("Query failed: {}", e);
                return Ok(());
            }
        };

        let s = &detail.stream;
        println!("streamId: {}", s.stream_id);
        println!("name:     {}", s.name);
        println!("type:     {}", s.type_or_unknown());
        println!("status:   {}", s.status_or_unknown());
        if let Some(ip) = &s.ip_addr {
            println!("ipAddr:   {}", ip);
        }
        if let Some(url) = &s.stream_url {
            println!("url:      {}", url);
        }
        if let Some(started) = detail.started_at() {
            println!("started:  {}", started.to_rfc3339());
        }
        if !s.extra.is_empty() {
            println!("other fields:");
            for line in extra_field_lines(&s.extra) {
                println!("  {}", line);
            }
        }

        if let Some(stats) = &detail.statistics {
            println!(
                "Viewers: HLS={} WebRTC={} RTMP={} DASH={}",
                stats.hls, stats.webrtc, stats.rtmp, stats.dash
            );
        }
        match &detail.camera_health {
            Some(CameraHealth::Fault(message)) => println!("Camera error: {}", message),
            Some(CameraHealth::Healthy) => println!("Camera: no errors"),
            None => {}
        }
        Ok(())
    }

    async fn export(&self, zone: &str, output: PathBuf) -> Result<()> {
        let inventory = self.inventory().await?;
        let rows = primary_sheet(&inventory, zone);
        write_sheet_file(&output, &rows)?;
        println!(
            "Zone {}: exported {} primary stream(s) to {}",
            zone.trim().to_uppercase(),
            rows.len(),
            output.display()
        );
        Ok(())
    }

    async fn rtsp_urls(&self) -> Result<()> {
        let inventory = self.inventory().await?;
        println!("Found {} stream(s):", inventory.len());
        println!("{}", "-".repeat(50));
        for s in &inventory {
            println!("Name:     {}", s.name);
            println!("Status:   {}", s.status.as_deref().unwrap_or("N/A"));
            println!("ID:       {}", s.stream_id);
            println!("RTSP URL: {}", s.stream_url.as_deref().unwrap_or("N/A"));
            println!("{}", "-".repeat(50));
        }
        Ok(())
    }
}

fn print_item(report: &ItemReport) {
    if report.verdict.success {
        println!(
            "streamId {} {}... success",
            report.stream_id,
            report.operation.progressive()
        );
    } else {
        println!(
            "streamId {} {}... failed: {}",
            report.stream_id,
            report.operation.progressive(),
            report.verdict.message
        );
    }
}

fn print_outcome(outcome: &BatchOutcome, skipped: usize) {
    if skipped > 0 {
        println!("Done: {} ({} skipped)", outcome, skipped);
    } else {
        println!("Done: {}", outcome);
    }
}

/// Commands that only read local configuration.
pub fn run_offline(config: &AppConfig, command: &Commands) -> Option<Result<()>> {
    match command {
        Commands::Profiles => {
            if config.profiles.is_empty() {
                println!("No profiles configured.");
            }
            for p in config.profiles.iter() {
                let csv = p
                    .streams_csv
                    .as_ref()
                    .map(|c| c.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<10} {:<50} origin={} csv={}", p.name, p.api_url, p.origin_ip, csv);
            }
            Some(Ok(()))
        }
        Commands::DeriveId { name } => Some(
            IdGenerator::new(config.secret_key.clone())
                .derive(name)
                .map(|id| println!("{}", id)),
        ),
        _ => None,
    }
}

/// `key: value` per unmodelled field, strings unquoted, in key order.
fn extra_field_lines(extra: &BTreeMap<String, Value>) -> Vec<String> {
    extra
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => format!("{}: {}", key, text),
            other => format!("{}: {}", key, other),
        })
        .collect()
}
