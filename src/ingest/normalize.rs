use crate::types::{NewEvent, SubmittedEvent};
use axum::extract::connect_info::{ConnectInfo, MockConnectInfo};
use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

/// The parts of an HTTP request used to fill in missing event fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Peer address as `host:port`.
    pub remote_addr: String,
    pub user_agent: Option<String>,
    /// Path plus query string, as received.
    pub request_target: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .or_else(|| {
                parts
                    .extensions
                    .get::<MockConnectInfo<SocketAddr>>()
                    .map(|MockConnectInfo(addr)| addr.to_string())
            })
            .unwrap_or_default();

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri)
            .unwrap_or(&parts.uri);
        let request_target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Ok(RequestContext {
            remote_addr,
            user_agent,
            request_target,
        })
    }
}

/// Drop a trailing `:port` by cutting at the last colon.
///
/// Not IPv6-aware: `[::1]:8080` becomes `[::1]`, a bare `::1` becomes `:`.
pub fn strip_port(addr: &str) -> &str {
    match addr.rfind(':') {
        Some(idx) => &addr[..idx],
        None => addr,
    }
}

/// Resolve every optional field of `event` against the request it arrived on.
pub fn normalize(event: SubmittedEvent, ctx: &RequestContext, timestamp: i64) -> NewEvent {
    let SubmittedEvent {
        property,
        ip,
        user_agent,
        description,
    } = event;

    NewEvent {
        timestamp,
        property,
        ip: ip.unwrap_or_else(|| strip_port(&ctx.remote_addr).to_string()),
        user_agent: user_agent.unwrap_or_else(|| ctx.user_agent.clone().unwrap_or_default()),
        description: description.unwrap_or_else(|| ctx.request_target.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn ctx() -> RequestContext {
        RequestContext {
            remote_addr: "203.0.113.7:54321".to_string(),
            user_agent: Some("curl/8.5.0".to_string()),
            request_target: "/events?src=landing".to_string(),
        }
    }

    fn bare(property: &str) -> SubmittedEvent {
        SubmittedEvent {
            property: property.to_string(),
            ip: None,
            user_agent: None,
            description: None,
        }
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("192.168.0.10:8080"), "192.168.0.10");
        assert_eq!(strip_port("192.168.0.10"), "192.168.0.10");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("::1"), ":");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn test_complete_event_is_untouched() {
        let submitted = SubmittedEvent {
            property: "test".to_string(),
            ip: Some("192.168.0.0".to_string()),
            user_agent: Some("secret agent".to_string()),
            description: Some("awesome thing".to_string()),
        };
        let event = normalize(submitted, &ctx(), 42);
        assert_eq!(
            event,
            NewEvent {
                timestamp: 42,
                property: "test".to_string(),
                ip: "192.168.0.0".to_string(),
                user_agent: "secret agent".to_string(),
                description: "awesome thing".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_fields_come_from_request() {
        let event = normalize(bare("test"), &ctx(), 42);
        assert_eq!(event.ip, "203.0.113.7");
        assert_eq!(event.user_agent, "curl/8.5.0");
        assert_eq!(event.description, "/events?src=landing");
    }

    #[test]
    fn test_missing_user_agent_header_gives_empty_string() {
        let mut context = ctx();
        context.user_agent = None;
        let event = normalize(bare("test"), &context, 42);
        assert_eq!(event.user_agent, "");
    }

    #[test]
    fn test_fields_are_resolved_independently() {
        let submitted = SubmittedEvent {
            user_agent: Some("explicit".to_string()),
            ..bare("test")
        };
        let event = normalize(submitted, &ctx(), 42);
        assert_eq!(event.ip, "203.0.113.7");
        assert_eq!(event.user_agent, "explicit");
        assert_eq!(event.description, "/events?src=landing");
    }

    #[test]
    fn test_empty_strings_are_not_defaulted() {
        let submitted = SubmittedEvent {
            property: String::new(),
            ip: Some(String::new()),
            user_agent: Some(String::new()),
            description: Some(String::new()),
        };
        let event = normalize(submitted, &ctx(), 42);
        assert_eq!(event.property, "");
        assert_eq!(event.ip, "");
        assert_eq!(event.user_agent, "");
        assert_eq!(event.description, "");
    }

    #[tokio::test]
    async fn test_context_from_request_parts() {
        let request = Request::builder()
            .uri("/events?a=1&b=2")
            .header(USER_AGENT, "Mozilla/5.0")
            .extension(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 4567))))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.remote_addr, "10.1.2.3:4567");
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(ctx.request_target, "/events?a=1&b=2");
    }

    #[tokio::test]
    async fn test_context_without_connect_info() {
        let request = Request::builder().uri("/events").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.remote_addr, "");
        assert_eq!(ctx.user_agent, None);
        assert_eq!(ctx.request_target, "/events");
    }
}
