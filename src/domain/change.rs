//! Bulk enable/disable requests for nodes on one device.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nodes to enable and nodes to disable in one operator request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChange {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl MembershipChange {
    /// Reject empty requests and nodes listed on both sides.
    pub fn validate(&self) -> Result<()> {
        if self.enabled.is_empty() && self.disabled.is_empty() {
            return Err(Error::Validation(
                "enabled or disabled have to have some content".to_string(),
            ));
        }

        let enabled: BTreeSet<&str> = self.enabled.iter().map(String::as_str).collect();
        let overlap: Vec<&str> = self
            .disabled
            .iter()
            .map(String::as_str)
            .filter(|node| enabled.contains(node))
            .collect();
        if !overlap.is_empty() {
            return Err(Error::Conflict(format!(
                "enabled and disabled must not have the same members [{}]",
                overlap.join(", ")
            )));
        }

        Ok(())
    }

    /// Requested state per node, enables first.
    pub fn targets(&self) -> impl Iterator<Item = (&str, bool)> {
        self.enabled
            .iter()
            .map(|node| (node.as_str(), true))
            .chain(self.disabled.iter().map(|node| (node.as_str(), false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(enabled: &[&str], disabled: &[&str]) -> MembershipChange {
        MembershipChange {
            enabled: enabled.iter().map(|s| s.to_string()).collect(),
            disabled: disabled.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_request_is_invalid() {
        assert!(matches!(
            change(&[], &[]).validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn overlap_is_a_conflict() {
        let err = change(&["/P/a", "/P/b"], &["/P/b"]).validate().unwrap_err();
        match err {
            Error::Conflict(msg) => assert!(msg.contains("/P/b")),
            other => panic!("expected conflict, got {other}"),
        }
    }

    #[test]
    fn one_sided_requests_are_fine() {
        assert!(change(&["/P/a"], &[]).validate().is_ok());
        assert!(change(&[], &["/P/a"]).validate().is_ok());
    }

    #[test]
    fn targets_pair_nodes_with_state() {
        let request = change(&["/P/a"], &["/P/b"]);
        let targets: Vec<_> = request.targets().collect();
        assert_eq!(targets, vec![("/P/a", true), ("/P/b", false)]);
    }
}
