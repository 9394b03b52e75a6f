//! Destination machines produced by discoverers and consumed by executors.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::EasysshError;

/// Selects which field of a [`Target`] addresses the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coalescer {
    Ip,
    Host,
    Hostname,
}

impl Coalescer {
    pub const ALL: [Coalescer; 3] = [Coalescer::Ip, Coalescer::Host, Coalescer::Hostname];

    pub fn as_str(&self) -> &'static str {
        match self {
            Coalescer::Ip => "ip",
            Coalescer::Host => "host",
            Coalescer::Hostname => "hostname",
        }
    }

    fn pick(&self, target: &Target) -> Option<String> {
        match self {
            Coalescer::Ip => target.ip.map(|ip| ip.to_string()),
            Coalescer::Host => Some(target.host.clone()).filter(|h| !h.is_empty()),
            Coalescer::Hostname => Some(target.hostname.clone()).filter(|h| !h.is_empty()),
        }
    }
}

impl FromStr for Coalescer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coalescer::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Coalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_COALESCE_ORDER: [Coalescer; 2] = [Coalescer::Ip, Coalescer::Host];

/// A machine to run against.
///
/// At least one of `ip` and `host` is always set; every constructor and mutator checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    hostname: String,
    ip: Option<IpAddr>,
    user: Option<String>,
    coalesce_order: Vec<Coalescer>,
}

impl Target {
    pub fn new(host: impl Into<String>, ip: Option<IpAddr>) -> Result<Self, EasysshError> {
        let target = Target {
            host: host.into(),
            hostname: String::new(),
            ip,
            user: None,
            coalesce_order: DEFAULT_COALESCE_ORDER.to_vec(),
        };
        target.verify()?;
        Ok(target)
    }

    pub fn from_host(host: impl Into<String>) -> Result<Self, EasysshError> {
        Self::new(host, None)
    }

    pub fn from_ip(ip: IpAddr) -> Self {
        Target {
            host: String::new(),
            hostname: String::new(),
            ip: Some(ip),
            user: None,
            coalesce_order: DEFAULT_COALESCE_ORDER.to_vec(),
        }
    }

    fn verify(&self) -> Result<(), EasysshError> {
        if self.ip.is_none() && self.host.is_empty() {
            return Err(EasysshError::invalid_target(
                "at least one of the IP and the host must be set",
            ));
        }
        Ok(())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn coalesce_order(&self) -> &[Coalescer] {
        &self.coalesce_order
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the login user; an empty user clears it.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = Some(user).filter(|u| !u.is_empty());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Result<Self, EasysshError> {
        self.host = host.into();
        self.verify()?;
        Ok(self)
    }

    pub fn with_ip(mut self, ip: Option<IpAddr>) -> Result<Self, EasysshError> {
        self.ip = ip;
        self.verify()?;
        Ok(self)
    }

    pub fn with_coalesce_order(mut self, order: Vec<Coalescer>) -> Self {
        self.coalesce_order = order;
        self
    }

    /// The string handed to ssh-family tools: `[user@]address`.
    ///
    /// The address is the first non-empty field in the coalesce order, falling back to
    /// the default `ip, host` order.
    pub fn ssh_target(&self) -> String {
        let address = self
            .coalesce_order
            .iter()
            .chain(DEFAULT_COALESCE_ORDER.iter())
            .find_map(|c| c.pick(self))
            .unwrap_or_default();
        self.with_user_prefix(address)
    }

    /// Human-facing name: hostname, else host, else IP.
    pub fn friendly_name(&self) -> String {
        let name = [Coalescer::Hostname, Coalescer::Host, Coalescer::Ip]
            .iter()
            .find_map(|c| c.pick(self))
            .unwrap_or_default();
        self.with_user_prefix(name)
    }

    fn with_user_prefix(&self, address: String) -> String {
        match &self.user {
            Some(user) => format!("{user}@{address}"),
            None => address,
        }
    }
}

impl FromStr for Target {
    type Err = EasysshError;

    /// Parses `[user@]address`, where the address is an IP when it parses as one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(EasysshError::invalid_target("empty target string"));
        }
        let parts: Vec<&str> = s.split('@').collect();
        let (user, address) = match parts.as_slice() {
            [address] => ("", *address),
            [user, address] => (*user, *address),
            _ => {
                return Err(EasysshError::invalid_target(format!(
                    "'{s}' contains more than one '@'"
                )))
            }
        };
        let target = match address.parse::<IpAddr>() {
            Ok(ip) => Target::from_ip(ip),
            Err(_) => Target::from_host(address).map_err(|_| {
                EasysshError::invalid_target(format!("'{s}' doesn't name a host"))
            })?,
        };
        Ok(target.with_user(user))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ssh_target())
    }
}

/// Formats a target list for logs: `[a b@c 10.0.0.1]`.
pub fn display_targets(targets: &[Target]) -> String {
    let names: Vec<String> = targets.iter().map(Target::ssh_target).collect();
    format!("[{}]", names.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn ssh_target_prefers_ip_then_host() {
        let both = Target::new("web-1", Some(ip("10.0.0.1"))).unwrap();
        assert_eq!(both.ssh_target(), "10.0.0.1");
        let host_only = Target::from_host("web-1").unwrap().with_user("root");
        assert_eq!(host_only.ssh_target(), "root@web-1");
    }

    #[test]
    fn coalesce_order_changes_the_address() {
        let target = Target::new("web-1.internal", Some(ip("10.0.0.1")))
            .unwrap()
            .with_hostname("web-1")
            .with_coalesce_order(vec![Coalescer::Hostname, Coalescer::Ip]);
        assert_eq!(target.ssh_target(), "web-1");
        let no_hostname = Target::from_ip(ip("10.0.0.2"))
            .with_coalesce_order(vec![Coalescer::Hostname]);
        assert_eq!(no_hostname.ssh_target(), "10.0.0.2");
    }

    #[test]
    fn friendly_name_prefers_hostname() {
        let target = Target::new("web-1.internal", Some(ip("10.0.0.1")))
            .unwrap()
            .with_hostname("web-1")
            .with_user("deploy");
        assert_eq!(target.friendly_name(), "deploy@web-1");
        assert_eq!(Target::from_ip(ip("::1")).friendly_name(), "::1");
    }

    #[test]
    fn parse_host_ip_and_user() {
        assert_eq!("foo".parse::<Target>().unwrap(), Target::from_host("foo").unwrap());
        assert_eq!(
            "root@10.0.0.3".parse::<Target>().unwrap(),
            Target::from_ip(ip("10.0.0.3")).with_user("root")
        );
        assert_eq!("@foo".parse::<Target>().unwrap(), Target::from_host("foo").unwrap());
        assert_eq!("root@foo".parse::<Target>().unwrap().ssh_target(), "root@foo");
    }

    #[test]
    fn parse_rejects_invalid_strings() {
        for bad in ["", "@", "root@", "a@b@c"] {
            let err = bad.parse::<Target>().unwrap_err();
            assert!(
                matches!(err, EasysshError::InvalidTarget { .. }),
                "{bad:?} gave {err}"
            );
        }
    }

    #[test]
    fn empty_ip_and_host_is_rejected_everywhere() {
        assert!(Target::new("", None).is_err());
        let target = Target::from_host("foo").unwrap();
        assert!(target.clone().with_host("").is_err());
        let with_ip = target.with_ip(Some(ip("10.0.0.1"))).unwrap();
        assert!(with_ip.clone().with_host("").is_ok());
        assert!(with_ip.with_host("").unwrap().with_ip(None).is_err());
    }

    #[test]
    fn coalescer_names() {
        assert_eq!("hostname".parse::<Coalescer>(), Ok(Coalescer::Hostname));
        assert!("fqdn".parse::<Coalescer>().is_err());
    }
}
