use std::collections::HashSet;

use crate::config::Config;

/// Paths served directly on the root (marketing/registration) domain.
const ROOT_ALLOWED_PATHS: &[&str] = &["/register", "/forgot-password", "/login"];

/// Path prefixes served directly on the root domain (public job board).
const ROOT_ALLOWED_PREFIXES: &[&str] = &["/jobs", "/api/jobs"];

/// Root-domain API endpoints that must stay reachable for registration and
/// password recovery.
const ROOT_ALLOWED_API_PATHS: &[&str] = &[
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
];

/// Tenant-subdomain paths that are served without the tenant path prefix.
/// These endpoints are tenant-agnostic templates/handlers that learn the
/// tenant from the forwarded subdomain, not from the path.
const TENANT_AUTH_PATHS: &[&str] = &["/login", "/forgot-password", "/reset-password"];

/// The decision the resolver takes for an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the client elsewhere. `location` may be a relative path (same
    /// host) or an absolute URL.
    Redirect { location: String },
    /// Serve the request under a (possibly rewritten) path, scoped to the
    /// given tenant subdomain. The subdomain is forwarded to downstream
    /// handlers via the `X-Tenant-Domain` header.
    Rewrite { path: String, subdomain: String },
    /// Serve the request unchanged (root-domain public pages).
    PassThrough,
}

/// The subset of [`Config`] the resolver consumes.
pub struct ResolverConfig {
    pub root_domain: String,
    pub reserved_subdomains: HashSet<String>,
}

impl From<&Config> for ResolverConfig {
    fn from(config: &Config) -> Self {
        Self {
            root_domain: config.root_domain.clone(),
            reserved_subdomains: config.reserved_subdomains.clone(),
        }
    }
}

/// Classifies an inbound request by hostname and decides whether to
/// redirect, rewrite into the tenant namespace, or pass through.
///
/// Pure with respect to its inputs: no I/O, no clock, no store access.
/// Tenant existence and session validity are checked downstream.
///
/// # Arguments
///
/// * `host` - The raw `Host` header value (may include a port).
/// * `path` - The request path.
/// * `session_present` - Whether a session cookie accompanied the request.
/// * `config` - Root domain and reserved subdomain labels.
pub fn resolve(host: &str, path: &str, session_present: bool, config: &ResolverConfig) -> Action {
    let hostname = normalize_host(host);

    if is_root_context(&hostname, &config.root_domain) {
        return resolve_root(path, is_local_dev_host(&hostname));
    }

    if let Some(label) = extract_subdomain(&hostname, &config.root_domain) {
        if config.reserved_subdomains.contains(&label) {
            return fallback_redirect(&config.root_domain);
        }
        return resolve_tenant(&hostname, path, &label, session_present);
    }

    // Malformed or unknown host: degrade to the safe default. Never serve
    // tenant data un-scoped.
    fallback_redirect(&config.root_domain)
}

/// Strips the port and lowercases the hostname.
fn normalize_host(host: &str) -> String {
    let stripped = if let Some(rest) = host.strip_prefix('[') {
        // Bracketed IPv6 literal, e.g. `[::1]:3000`.
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
    };
    stripped.trim_end_matches('.').to_lowercase()
}

/// Whether the hostname addresses the root/marketing context rather than a
/// tenant. Local-development aliases (localhost, loopback, private IPv4
/// ranges) are treated as the root domain.
fn is_root_context(hostname: &str, root_domain: &str) -> bool {
    hostname == root_domain || is_local_dev_host(hostname)
}

/// Local-development aliases for the root domain. Unlike the real root
/// domain, these serve the entire API surface, because there is no
/// subdomain to dispatch on.
fn is_local_dev_host(hostname: &str) -> bool {
    hostname == "localhost" || hostname == "::1" || is_private_or_loopback_ipv4(hostname)
}

fn is_private_or_loopback_ipv4(hostname: &str) -> bool {
    let octets: Vec<u8> = hostname
        .split('.')
        .map(|p| p.parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .unwrap_or_default();
    if octets.len() != 4 {
        return false;
    }
    match octets[0] {
        127 | 10 => true,
        192 => octets[1] == 168,
        172 => (16..=31).contains(&octets[1]),
        _ => false,
    }
}

/// Extracts a single tenant label from `<label>.<root_domain>`.
fn extract_subdomain(hostname: &str, root_domain: &str) -> Option<String> {
    let label = hostname.strip_suffix(root_domain)?.strip_suffix('.')?;
    if label.is_empty() || !is_valid_label(label) {
        return None;
    }
    Some(label.to_string())
}

/// A tenant label is a single DNS label: lowercase alphanumerics and
/// hyphens, no dots.
fn is_valid_label(label: &str) -> bool {
    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn resolve_root(path: &str, local_dev: bool) -> Action {
    if path == "/" {
        return Action::Redirect {
            location: "/register".to_string(),
        };
    }

    let allowed = ROOT_ALLOWED_PATHS.contains(&path)
        || ROOT_ALLOWED_API_PATHS.contains(&path)
        || ROOT_ALLOWED_PREFIXES
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
        || (local_dev && path.starts_with("/api/"));

    if allowed {
        Action::PassThrough
    } else {
        Action::Redirect {
            location: "/register".to_string(),
        }
    }
}

fn resolve_tenant(hostname: &str, path: &str, label: &str, session_present: bool) -> Action {
    if path == "/" {
        if !session_present {
            return Action::Redirect {
                location: format!("https://{}/login", hostname),
            };
        }
        return Action::Rewrite {
            path: format!("/{}/dashboard", label),
            subdomain: label.to_string(),
        };
    }

    // Auth pages and the API surface are tenant-agnostic paths; the tenant
    // travels in the forwarded header instead of the path.
    let tenant_agnostic = TENANT_AUTH_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
        || path.starts_with("/api/");

    if tenant_agnostic {
        return Action::Rewrite {
            path: path.to_string(),
            subdomain: label.to_string(),
        };
    }

    // Prefix the tenant label unless the path already carries it, so the
    // rewrite is idempotent.
    let prefix = format!("/{}", label);
    let path = if path == prefix || path.starts_with(&format!("{}/", prefix)) {
        path.to_string()
    } else {
        format!("{}{}", prefix, path)
    };

    Action::Rewrite {
        path,
        subdomain: label.to_string(),
    }
}

fn fallback_redirect(root_domain: &str) -> Action {
    Action::Redirect {
        location: format!("https://{}/register", root_domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResolverConfig {
        ResolverConfig {
            root_domain: "example.com".to_string(),
            reserved_subdomains: ["www", "api", "mail"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    #[test]
    fn tenant_root_without_session_redirects_to_login() {
        let action = resolve("acme.example.com", "/", false, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "https://acme.example.com/login".to_string()
            }
        );
    }

    #[test]
    fn tenant_root_with_session_rewrites_to_dashboard() {
        let action = resolve("acme.example.com", "/", true, &config());
        assert_eq!(
            action,
            Action::Rewrite {
                path: "/acme/dashboard".to_string(),
                subdomain: "acme".to_string()
            }
        );
    }

    #[test]
    fn root_domain_root_redirects_to_register() {
        let action = resolve("example.com", "/", false, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "/register".to_string()
            }
        );
    }

    #[test]
    fn root_domain_jobs_passes_through() {
        assert_eq!(
            resolve("example.com", "/jobs", false, &config()),
            Action::PassThrough
        );
        assert_eq!(
            resolve("example.com", "/jobs/42", true, &config()),
            Action::PassThrough
        );
        assert_eq!(
            resolve("example.com", "/api/jobs", false, &config()),
            Action::PassThrough
        );
    }

    #[test]
    fn root_domain_unknown_path_redirects_to_register() {
        let action = resolve("example.com", "/pricing", true, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "/register".to_string()
            }
        );
    }

    #[test]
    fn unknown_host_redirects_to_root_register() {
        let action = resolve("bogus-host", "/anything", true, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "https://example.com/register".to_string()
            }
        );
    }

    #[test]
    fn unrelated_domain_redirects_to_root_register() {
        let action = resolve("evil.other.org", "/", false, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "https://example.com/register".to_string()
            }
        );
    }

    #[test]
    fn reserved_label_is_not_a_tenant() {
        let action = resolve("www.example.com", "/", true, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "https://example.com/register".to_string()
            }
        );
    }

    #[test]
    fn nested_labels_are_not_a_tenant() {
        let action = resolve("a.b.example.com", "/", true, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "https://example.com/register".to_string()
            }
        );
    }

    #[test]
    fn port_is_stripped_and_case_normalized() {
        let action = resolve("ACME.Example.COM:8443", "/", true, &config());
        assert_eq!(
            action,
            Action::Rewrite {
                path: "/acme/dashboard".to_string(),
                subdomain: "acme".to_string()
            }
        );
    }

    #[test]
    fn localhost_and_private_ranges_are_root_context() {
        for host in [
            "localhost:3000",
            "127.0.0.1",
            "10.0.0.5:8080",
            "192.168.1.20",
            "172.16.0.1",
            "[::1]:3000",
        ] {
            assert_eq!(
                resolve(host, "/register", false, &config()),
                Action::PassThrough,
                "host {host} should be root context"
            );
        }
    }

    #[test]
    fn local_dev_hosts_serve_the_whole_api_surface() {
        for path in [
            "/api/leave-types",
            "/api/leave-requests",
            "/api/employees",
            "/api/job-postings",
        ] {
            assert_eq!(
                resolve("localhost:3000", path, true, &config()),
                Action::PassThrough,
                "path {path} must be reachable on localhost"
            );
            assert_eq!(
                resolve("127.0.0.1:3000", path, true, &config()),
                Action::PassThrough,
                "path {path} must be reachable on loopback"
            );
        }
    }

    #[test]
    fn real_root_domain_keeps_the_api_allow_list() {
        let action = resolve("example.com", "/api/leave-requests", true, &config());
        assert_eq!(
            action,
            Action::Redirect {
                location: "/register".to_string()
            }
        );
    }

    #[test]
    fn tenant_page_path_gets_prefixed() {
        let action = resolve("acme.example.com", "/employees", true, &config());
        assert_eq!(
            action,
            Action::Rewrite {
                path: "/acme/employees".to_string(),
                subdomain: "acme".to_string()
            }
        );
    }

    #[test]
    fn already_prefixed_path_is_untouched() {
        let action = resolve("acme.example.com", "/acme/dashboard", true, &config());
        assert_eq!(
            action,
            Action::Rewrite {
                path: "/acme/dashboard".to_string(),
                subdomain: "acme".to_string()
            }
        );
    }

    #[test]
    fn tenant_auth_paths_are_not_prefixed() {
        for path in ["/login", "/forgot-password", "/api/auth/login"] {
            let action = resolve("acme.example.com", path, false, &config());
            assert_eq!(
                action,
                Action::Rewrite {
                    path: path.to_string(),
                    subdomain: "acme".to_string()
                },
                "path {path} should rewrite without a prefix"
            );
        }
    }

    #[test]
    fn tenant_api_paths_keep_their_path() {
        let action = resolve("acme.example.com", "/api/leave-requests", true, &config());
        assert_eq!(
            action,
            Action::Rewrite {
                path: "/api/leave-requests".to_string(),
                subdomain: "acme".to_string()
            }
        );
    }

    #[test]
    fn resolver_is_deterministic() {
        let cfg = config();
        let first = resolve("acme.example.com", "/api/employees", true, &cfg);
        let second = resolve("acme.example.com", "/api/employees", true, &cfg);
        assert_eq!(first, second);
    }
}
