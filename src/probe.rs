//! Connectivity probe for the sensor device.
//!
//! Resolves the sensor host, sends a single ping and one HTTP GET, and
//! condenses the outcome into one log line. Used to tell a dead Wi-Fi link
//! from a sensor firmware that stopped answering HTTP.

use std::{net::IpAddr, time::Duration};

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::process::Command;

const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Parser)]
#[command(name = "cuve-probe", version, about = "Watch sensor reachability (DNS, ping, HTTP)")]
pub struct ProbeArgs {
    #[arg(long, env = "CUVE_SENSOR_URL")]
    pub sensor_url: String,

    #[arg(long, env = "CUVE_MONITOR_INTERVAL_SECONDS", default_value_t = 60)]
    pub interval_seconds: u64,

    #[arg(long, env = "CUVE_PING_TIMEOUT_SECONDS", default_value_t = 1)]
    pub ping_timeout_seconds: u64,

    #[arg(long, env = "CUVE_HTTP_TIMEOUT_SECONDS", default_value_t = 2.0)]
    pub http_timeout_seconds: f64,

    #[arg(long, env = "CUVE_MONITOR_LOG", default_value = "cuve_monitor.log")]
    pub log_path: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Ok,
    PingOnly,
    HttpOnly,
    Down,
}

impl ProbeStatus {
    pub fn classify(ping_ok: bool, http_ok: bool) -> Self {
        match (ping_ok, http_ok) {
            (true, true) => ProbeStatus::Ok,
            (true, false) => ProbeStatus::PingOnly,
            (false, true) => ProbeStatus::HttpOnly,
            (false, false) => ProbeStatus::Down,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Ok => "OK",
            ProbeStatus::PingOnly => "PING_ONLY",
            ProbeStatus::HttpOnly => "HTTP_ONLY",
            ProbeStatus::Down => "DOWN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub ok: bool,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub host: String,
    pub ip: Option<IpAddr>,
    pub ping: CheckResult,
    pub http: CheckResult,
}

impl ProbeReport {
    pub fn status(&self) -> ProbeStatus {
        ProbeStatus::classify(self.ping.ok, self.http.ok)
    }

    pub fn to_line(&self, timestamp: &str) -> String {
        let ip = self
            .ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "DNS_FAIL".to_string());
        format!(
            "{timestamp} | {:<9} | host={} ip={ip} | ping={} '{}' | http={} '{}'",
            self.status().as_str(),
            self.host,
            self.ping.ok,
            self.ping.summary,
            self.http.ok,
            self.http.summary,
        )
    }
}

pub fn sensor_host(sensor_url: &str) -> Result<String> {
    let url = Url::parse(sensor_url).map_err(|err| anyhow!("invalid URL {sensor_url}: {err}"))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("URL {sensor_url} has no host"))
}

pub async fn resolve(host: &str) -> Option<IpAddr> {
    tokio::net::lookup_host((host, 0))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip())
}

/// Picks the most telling line out of `ping` output.
pub fn summarize_ping_output(output: &str) -> String {
    let lines: Vec<&str> = output.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .find(|line| {
            line.contains("bytes from")
                || line.contains("Destination Host Unreachable")
                || line.contains("100% packet loss")
        })
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "no output".to_string())
}

pub async fn ping_once(target: &str, timeout_seconds: u64) -> CheckResult {
    let output = Command::new("ping")
        .args(["-c", "1", "-W", &timeout_seconds.to_string(), target])
        .output()
        .await;

    match output {
        Ok(output) => {
            let text = format!(
                "{}\n{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            CheckResult {
                ok: output.status.success(),
                summary: summarize_ping_output(&text),
            }
        }
        Err(err) => CheckResult {
            ok: false,
            summary: format!("ping error: {err}"),
        },
    }
}

pub async fn http_get(client: &Client, url: &str) -> CheckResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body
                .trim()
                .replace('\n', "")
                .chars()
                .take(BODY_EXCERPT_CHARS)
                .collect();
            CheckResult {
                ok: status == reqwest::StatusCode::OK,
                summary: format!("HTTP {} {excerpt}", status.as_u16()),
            }
        }
        Err(err) => CheckResult {
            ok: false,
            summary: format!("http error: {err}"),
        },
    }
}

pub async fn probe_once(client: &Client, args: &ProbeArgs, host: &str) -> ProbeReport {
    let ip = resolve(host).await;
    let ping_target = ip.map(|ip| ip.to_string()).unwrap_or_else(|| host.to_string());
    let ping = ping_once(&ping_target, args.ping_timeout_seconds).await;
    let http = http_get(client, &args.sensor_url).await;

    ProbeReport {
        host: host.to_string(),
        ip,
        ping,
        http,
    }
}

/// Probes forever, printing each line and appending it to the log file.
pub async fn run_probe(args: ProbeArgs) -> Result<()> {
    let host = sensor_host(&args.sensor_url)?;
    let client = Client::builder()
        .timeout(Duration::from_secs_f64(args.http_timeout_seconds.max(0.1)))
        .build()?;

    println!("Monitoring CUVE_SENSOR_URL={}", args.sensor_url);
    println!(
        "Host={host} | interval={}s | log={}",
        args.interval_seconds,
        args.log_path.display()
    );
    println!("CTRL+C to stop.\n");

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_seconds.max(1)));
    loop {
        ticker.tick().await;
        let report = probe_once(&client, &args, &host).await;
        let line = report.to_line(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        println!("{line}");
        append_line(&args.log_path, &line).await?;
    }
}

async fn append_line(path: &std::path::Path, line: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    Ok(())
}
