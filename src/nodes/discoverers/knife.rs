use std::fmt;
use std::net::IpAddr;

use serde::Deserialize;
use tracing::{debug, info};

use crate::diagnostics::Arity;
use crate::nodes::{check_arity, Arg, Discoverer};
use crate::runtime::Context;
use crate::target::{Coalescer, Target};
use crate::EasysshError;

/// Which address a knife-discovered target is reached at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnifeAddress {
    /// The IP, falling back to the host name (`knife`).
    Ip,
    /// The host name, falling back to the IP (`knife-hostname`).
    Hostname,
}

/// `(knife)` / `(knife-hostname)`: Chef node search via `knife search node`.
///
/// Inputs without a `:` cannot be node queries and return nothing without running knife.
#[derive(Debug)]
pub struct Knife {
    address: KnifeAddress,
}

// Shape of `knife search node -F json`, reduced to the attributes used for addressing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResult {
    rows: Vec<Row>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Row {
    name: String,
    automatic: Automatic,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Automatic {
    cloud_v2: Option<CloudV2>,
    ipaddress: Option<String>,
    hostname: Option<String>,
    fqdn: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CloudV2 {
    public_hostname: Option<String>,
    public_ipv4: Option<String>,
    local_hostname: Option<String>,
    local_ipv4: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Knife {
    pub fn new(address: KnifeAddress) -> Self {
        Self { address }
    }

    fn name(&self) -> &'static str {
        match self.address {
            KnifeAddress::Ip => "knife",
            KnifeAddress::Hostname => "knife-hostname",
        }
    }

    pub(crate) fn configure(&mut self, args: Vec<Arg<Discoverer>>) -> Result<(), EasysshError> {
        check_arity(&self.to_string(), Arity::None, &args)
    }

    pub(crate) fn discover(&self, input: &str, ctx: &Context) -> Result<Vec<Target>, EasysshError> {
        if !input.contains(':') {
            debug!("Host lookup string doesn't contain ':', it won't match anything in a knife search node query");
            return Ok(Vec::new());
        }

        info!("Looking up nodes with knife matching {input}");
        let args: Vec<String> = ["search", "node", "-F", "json", input]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = ctx.commands().output("knife", &args)?;
        if !out.success {
            return Err(EasysshError::external(format!(
                "Knife lookup failed: exit code {}\nOutput:\n{}{}",
                out.exit_code, out.stdout, out.stderr
            )));
        }

        let result: SearchResult = serde_json::from_str(&out.stdout).map_err(|e| {
            EasysshError::external_with(format!("Failed to parse knife search result: {e}"), e)
        })?;

        let mut targets = Vec::with_capacity(result.rows.len());
        for row in result.rows {
            let name = row.name.clone();
            match self.extract(row) {
                Some(target) => targets.push(target),
                None => info!("Host {name} doesn't have an IP address or public hostname, ignoring"),
            }
        }
        Ok(targets)
    }

    /// Prefers the public cloud address, then the private one, then fqdn and ipaddress.
    fn extract(&self, row: Row) -> Option<Target> {
        let automatic = row.automatic;
        let cloud = automatic.cloud_v2.unwrap_or_default();
        let (host, ip) = if let Some(host) = non_empty(cloud.public_hostname) {
            (Some(host), cloud.public_ipv4)
        } else if let Some(host) = non_empty(cloud.local_hostname) {
            (Some(host), cloud.local_ipv4)
        } else {
            (automatic.fqdn, automatic.ipaddress)
        };

        let ip = non_empty(ip).and_then(|raw| match raw.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                debug!("Ignoring unparsable address {raw} of {}", row.name);
                None
            }
        });
        let order = match self.address {
            KnifeAddress::Ip => vec![Coalescer::Ip, Coalescer::Host],
            KnifeAddress::Hostname => vec![Coalescer::Host, Coalescer::Ip],
        };
        Target::new(host.unwrap_or_default(), ip).ok().map(|target| {
            target
                .with_hostname(automatic.hostname.unwrap_or_default())
                .with_coalesce_order(order)
        })
    }
}

impl fmt::Display for Knife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}
