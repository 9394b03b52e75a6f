use std::fmt;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Filter};
use crate::runtime::Context;
use crate::target::Target;
use crate::EasysshError;

static INSTANCE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"i-[0-9a-f]{8}(?:[0-9a-f]{9})?").expect("instance id regex is valid")
});

/// `(ec2-instance-id REGION)`: resolves EC2 instance ids to public addresses.
///
/// Targets whose host contains an instance id are looked up with
/// `aws ec2 describe-instances`; their host becomes the instance's public IP. Lookups that
/// fail or find nothing leave the target as it was.
#[derive(Debug, Default)]
pub struct Ec2InstanceId {
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct DescribeInstances {
    reservations: Vec<Reservation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Reservation {
    instances: Vec<Instance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Instance {
    public_ip_address: Option<String>,
}

impl Ec2InstanceId {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::Exactly(1), &args)?;
        self.region = atom_strings(&owner, args)?.pop();
        Ok(())
    }

    pub(crate) fn filter(
        &self,
        targets: Vec<Target>,
        ctx: &Context,
    ) -> Result<Vec<Target>, EasysshError> {
        let region = self
            .region
            .as_deref()
            .ok_or_else(|| EasysshError::unconfigured(self))?;
        targets
            .into_iter()
            .map(|target| resolve(target, region, ctx))
            .collect()
    }
}

fn resolve(target: Target, region: &str, ctx: &Context) -> Result<Target, EasysshError> {
    let Some(id) = INSTANCE_ID.find(target.host()).map(|m| m.as_str().to_string()) else {
        return Ok(target);
    };

    let args: Vec<String> = [
        "ec2",
        "describe-instances",
        "--instance-id",
        id.as_str(),
        "--region",
        region,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    debug!("EC2 instance lookup: aws {}", args.join(" "));
    let out = ctx.commands().output("aws", &args)?;
    if !out.success {
        info!(
            "EC2 instance lookup failed for {} ({id}) in region {region}: {}",
            target.host(),
            out.stderr.trim()
        );
        return Ok(target);
    }

    let described: DescribeInstances = serde_json::from_str(&out.stdout).map_err(|e| {
        EasysshError::external_with(format!("Invalid JSON returned by AWS API for {id}"), e)
    })?;
    let address = described
        .reservations
        .into_iter()
        .next()
        .and_then(|r| r.instances.into_iter().next())
        .and_then(|i| i.public_ip_address)
        .filter(|a| !a.is_empty());
    let Some(address) = address else {
        info!("EC2 instance {id} in region {region} has no public IP address");
        return Ok(target);
    };

    debug!("EC2 instance {id} resolved to {address}");
    let ip = address.parse::<IpAddr>().ok();
    target.with_host(address)?.with_ip(ip)
}

impl fmt::Display for Ec2InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "<ec2-instance-id {region}>"),
            None => f.write_str("<ec2-instance-id>"),
        }
    }
}
