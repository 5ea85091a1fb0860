// ABOUTME: SSH server address parsing.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
}

impl ServerAddress {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("server address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = if let Some(at_pos) = s.find('@') {
            (Some(&s[..at_pos]), &s[at_pos + 1..])
        } else {
            (None, s)
        };

        let (host, port) = if let Some(colon_pos) = rest.rfind(':') {
            let port_str = &rest[colon_pos + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {}", port_str))?;
            (&rest[..colon_pos], Some(port))
        } else {
            (rest, None)
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        if matches!(user_part, Some("")) {
            return Err("user cannot be empty".to_string());
        }

        Ok(ServerAddress {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_form() {
        let addr = ServerAddress::parse("deploy@203.0.113.10:2222").unwrap();
        assert_eq!(addr.user.as_deref(), Some("deploy"));
        assert_eq!(addr.host, "203.0.113.10");
        assert_eq!(addr.port, Some(2222));
    }

    #[test]
    fn parses_bare_host() {
        let addr = ServerAddress::parse("app.example.com").unwrap();
        assert_eq!(addr.user, None);
        assert_eq!(addr.port, None);
    }

    #[test]
    fn rejects_bad_port_and_empty_parts() {
        assert!(ServerAddress::parse("host:ssh").is_err());
        assert!(ServerAddress::parse("deploy@").is_err());
        assert!(ServerAddress::parse("@host").is_err());
        assert!(ServerAddress::parse("").is_err());
    }
}
