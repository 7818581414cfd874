//! Service and Ingress recipes.

use super::config::string_list;
use super::{rewrite_scalars, Recipe, RecipeError, Visit};
use crate::fieldpath::{Cursor, Path};
use crate::jsonpath::{PathExpression, Segment};
use crate::merge::{flag_matches, Findings};
use crate::model::Document;
use once_cell::sync::Lazy;
use serde::Deserialize;

static EXTERNAL_IPS: Lazy<PathExpression> = Lazy::new(|| {
    PathExpression::from_segments(vec![
        Segment::Root,
        Segment::Field("spec".to_string()),
        Segment::Field("externalIPs".to_string()),
        Segment::Wildcard,
    ])
});

/// Returns the `spec.externalIPs` entries of a Service.
fn external_ips(document: &Document) -> Vec<Cursor<'_>> {
    if !document.model().is_kind(Some("Service")) {
        return Vec::new();
    }
    EXTERNAL_IPS.find(document.root())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindServicesByTypeOptions {
    pub service_type: String,
}

impl FindServicesByTypeOptions {
    pub fn build(self) -> Result<FindServicesByType, RecipeError> {
        Ok(FindServicesByType {
            service_type: self.service_type,
        })
    }
}

/// FindServicesByType flags the spec of Services of a given type. A Service
/// without `spec.type` is a `ClusterIP` service.
#[derive(Debug, Clone)]
pub struct FindServicesByType {
    service_type: String,
}

impl Recipe for FindServicesByType {
    fn name(&self) -> &'static str {
        "find-services-by-type"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        if !document.model().is_kind(Some("Service")) {
            return Ok(Visit::unchanged());
        }
        let Some(spec) = Cursor::root(document.root()).field("spec") else {
            return Ok(Visit::unchanged());
        };
        let actual = spec
            .node()
            .get("type")
            .and_then(|n| n.as_str())
            .unwrap_or("ClusterIP");
        let findings = flag_matches(&[spec], |_| {
            (actual == self.service_type).then(|| format!("type:{}", actual))
        });
        Ok(Visit::found(findings))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindServiceExternalIpsOptions {
    #[serde(deserialize_with = "string_list")]
    pub ip_addresses: Vec<String>,
}

impl FindServiceExternalIpsOptions {
    pub fn build(self) -> Result<FindServiceExternalIps, RecipeError> {
        Ok(FindServiceExternalIps {
            ip_addresses: self.ip_addresses,
        })
    }
}

/// FindServiceExternalIps flags external IPs of Services that are on a list.
#[derive(Debug, Clone)]
pub struct FindServiceExternalIps {
    ip_addresses: Vec<String>,
}

impl Recipe for FindServiceExternalIps {
    fn name(&self) -> &'static str {
        "find-service-external-ips"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let findings = flag_matches(&external_ips(document), |c| {
            let ip = c.node().as_str()?;
            self.ip_addresses
                .iter()
                .any(|a| a == ip)
                .then(|| "IP".to_string())
        });
        Ok(Visit::found(findings))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceExternalIpOptions {
    pub ip_to_find: String,
    pub ip_to_update: String,
}

impl UpdateServiceExternalIpOptions {
    pub fn build(self) -> Result<UpdateServiceExternalIp, RecipeError> {
        Ok(UpdateServiceExternalIp {
            find: self.ip_to_find,
            update: self.ip_to_update,
        })
    }
}

/// UpdateServiceExternalIp replaces one external IP of Services.
#[derive(Debug, Clone)]
pub struct UpdateServiceExternalIp {
    find: String,
    update: String,
}

impl Recipe for UpdateServiceExternalIp {
    fn name(&self) -> &'static str {
        "update-service-external-ip"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let edits: Vec<(Path, String)> = external_ips(document)
            .into_iter()
            .filter(|c| c.node().as_str() == Some(self.find.as_str()))
            .map(|c| (c.path(), self.update.clone()))
            .collect();
        Ok(match rewrite_scalars(document.root(), edits) {
            Some(root) => Visit::changed(root),
            None => Visit::unchanged(),
        })
    }
}

const ALLOW_HTTP: &str = "kubernetes.io/ingress.allow-http";

static TLS_HOSTS: Lazy<PathExpression> = Lazy::new(|| {
    PathExpression::from_segments(vec![
        Segment::Root,
        Segment::Field("spec".to_string()),
        Segment::Field("tls".to_string()),
        Segment::Wildcard,
        Segment::Field("hosts".to_string()),
    ])
});

/// FindNonTlsIngress flags Ingresses that configure no TLS hosts or do not
/// disallow plain HTTP.
#[derive(Debug, Clone, Default)]
pub struct FindNonTlsIngress;

impl Recipe for FindNonTlsIngress {
    fn name(&self) -> &'static str {
        "find-non-tls-ingress"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let model = document.model();
        if !model.is_kind(Some("Ingress")) {
            return Ok(Visit::unchanged());
        }
        let mut findings = Findings::new();
        if TLS_HOSTS.find(document.root()).is_empty() {
            findings.flag(Path::new(), "missing TLS");
        }
        if model.annotation(ALLOW_HTTP) != Some("false") {
            findings.flag(Path::new(), "missing disallow http");
        }
        Ok(Visit::found(findings))
    }
}
