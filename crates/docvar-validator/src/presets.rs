//! Built-in rule-set presets
//!
//! Presets are addressable by id from any placeholder descriptor without
//! being declared in the `validators` list. Custom rule-sets with the same id
//! take precedence.

use crate::error::ValidatorResult;
use crate::rule::{must_match, must_not_match, should_match, should_not_match, RuleSet, ValidatorRule};
use once_cell::sync::Lazy;
use std::sync::Arc;

const CIDR_SUFFIX: &str = "/(3[0-2]|[12]?[0-9])";
const IPV4_SEGMENT: &str = "(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";
const IPV6_SHAPE: &str = r"(([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,5}(:[0-9a-fA-F]{1,4}){1,2}|([0-9a-fA-F]{1,4}:){1,4}(:[0-9a-fA-F]{1,4}){1,3}|([0-9a-fA-F]{1,4}:){1,3}(:[0-9a-fA-F]{1,4}){1,4}|([0-9a-fA-F]{1,4}:){1,2}(:[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:((:[0-9a-fA-F]{1,4}){1,6})|:((:[0-9a-fA-F]{1,4}){1,7}|:)|fe80:(:[0-9a-fA-F]{0,4}){0,4}%[0-9a-zA-Z]+|::(ffff(:0{1,4})?:)?((25[0-5]|(2[0-4]|1?[0-9])?[0-9])\.){3}(25[0-5]|(2[0-4]|1?[0-9])?[0-9])|([0-9a-fA-F]{1,4}:){1,4}:((25[0-5]|(2[0-4]|1?[0-9])?[0-9])\.){3}(25[0-5]|(2[0-4]|1?[0-9])?[0-9]))";
const URL_SHAPE: &str = r"[a-zA-Z0-9-]+://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+(#\S*)?";
const PORT_SHAPE: &str = r"^((6553[0-5])|(655[0-2][0-9])|(65[0-4][0-9]{2})|(6[0-4][0-9]{3})|([1-5][0-9]{4})|([0-5]{0,5})|([0-9]{1,4}))$";
const MAC_SHAPE: &str = r"^[a-fA-F0-9]{2}(:[a-fA-F0-9]{2}){5}$";
const UUID_SHAPE: &str = r"^[0-9a-fA-F]{8}\b-[0-9a-fA-F]{4}\b-[0-9a-fA-F]{4}\b-[0-9a-fA-F]{4}\b-[0-9a-fA-F]{12}$";

const WINDOWS_PROHIBITED: &str = "Can not contain prohibited characters: '<>:\"|?*'";

static PRESETS: Lazy<Vec<Arc<RuleSet>>> = Lazy::new(|| {
    build_presets()
        .expect("built-in presets compile")
        .into_iter()
        .map(Arc::new)
        .collect()
});

/// All built-in presets
#[must_use]
pub fn presets() -> &'static [Arc<RuleSet>] {
    &PRESETS
}

/// Look up a built-in preset by id
#[must_use]
pub fn preset(id: &str) -> Option<Arc<RuleSet>> {
    PRESETS.iter().find(|set| set.id() == id).cloned()
}

fn ipv4_address() -> String {
    format!(r"{IPV4_SEGMENT}(?:\.{IPV4_SEGMENT}){{3}}")
}

fn ipv4_address_dashes() -> String {
    let segment = format!("{IPV4_SEGMENT}(-{IPV4_SEGMENT})?");
    format!(r"{segment}(?:\.{segment}){{3}}")
}

fn domain_rules() -> ValidatorResult<Vec<ValidatorRule>> {
    Ok(vec![
        must_match(
            "^[a-zA-Z0-9.-]+$",
            "Only letters, numbers, dashes (minus signs), and dots are allowed",
        )?,
        must_match("^[^.-]", "Can not begin with a dot or dash (minus sign)")?,
        must_match("[^.-]$", "Can not end with a dot or dash (minus sign)")?,
        should_not_match(
            "[a-zA-Z0-9-]{64}",
            "Subdomains should not be longer than 63 characters",
        )?,
    ])
}

fn url_no_whitespace() -> ValidatorResult<ValidatorRule> {
    must_not_match(
        r"\s",
        "URLs may not contain whitespace. Please URL encode it. For example a space should be replaced with '%20'",
    )
}

fn not_empty() -> ValidatorResult<ValidatorRule> {
    must_match("^.+$", "Can not be empty")
}

fn warn_whitespace() -> ValidatorResult<ValidatorRule> {
    should_not_match(r"\s", "Should not contain whitespace")
}

#[allow(clippy::too_many_lines)]
fn build_presets() -> ValidatorResult<Vec<RuleSet>> {
    let ipv4 = ipv4_address();
    let mut domain = domain_rules()?;
    domain.push(should_match(
        r"\.",
        "Should contain multiple elements (for example domain.com or my.domain.com)",
    )?);

    let sets = vec![
        RuleSet::new(
            "ipv4_address",
            "IPv4 address",
            vec![
                must_match("^[0-9.]+$", "Only numbers and dots are allowed")?,
                should_match(&format!("^{ipv4}$"), "Expected an value like 123.4.56.78")?,
            ],
        )?,
        RuleSet::new(
            "ipv4_range_cidr",
            "IPv4 address range (CIDR notation)",
            vec![
                must_match("^[0-9./]+$", "Only numbers, dots and a slash are allowed")?,
                must_not_match("/.*/", "May only contain one slash")?,
                must_match(
                    &format!("{CIDR_SUFFIX}$"),
                    "The number after that slash needs to be between 0 and 32 (inclusive)",
                )?,
                should_match(&format!("^{ipv4}/[0-9]+$"), "Expected an value like 123.4.56.0/24")?,
            ],
        )?,
        RuleSet::new(
            "ipv4_range_dashes",
            "IPv4 address range (dash)",
            vec![
                must_match("^[0-9.-]+$", "Only numbers, dots and minuses are allowed")?,
                must_not_match(r"(-\.|\.-|^-|-$)", "Number should be on both sites of the dash")?,
                must_not_match("--", "Consecutive dashes are not allowed")?,
                should_match(
                    &format!("^{}$", ipv4_address_dashes()),
                    "Expected an value like 123.4-5.56.78-90",
                )?,
            ],
        )?,
        RuleSet::new(
            "ipv6_address",
            "IPv6 address",
            vec![
                must_match(
                    r"^[0-9a-fA-F:.\[\]]+$",
                    "Only numbers, the letters A-F, colons, dots, and square brackets are allowed",
                )?,
                should_match(
                    &format!("^{IPV6_SHAPE}$"),
                    "Should probably look like '2001:0db8:85a3:0000:0000:8a2e:0370:7334' or '::1'",
                )?,
                should_not_match(
                    &format!("^{ipv4}$"),
                    "Should not be an IPv4 address. If you want a IPv4-mapped IPv6 address, prefix it with '::FFFF:' like this: '::FFFF:123.4.56.78'",
                )?,
            ],
        )?,
        RuleSet::new("domain", "Domain name", domain)?,
        RuleSet::new("hostname", "Hostname", domain_rules()?)?,
        RuleSet::new(
            "url_any",
            "URL (any protocol)",
            vec![
                url_no_whitespace()?,
                should_match(
                    &format!("^{URL_SHAPE}$"),
                    "Expected an value like smb://example.com:10445/share/some-file.txt",
                )?,
            ],
        )?,
        RuleSet::new(
            "url_http",
            "URL (HTTP / HTTPS)",
            vec![
                must_match("^https?://", "Needs to start with 'http://' or 'https://'")?,
                url_no_whitespace()?,
                should_match(
                    &format!("^{URL_SHAPE}$"),
                    "Expected an value like https://example.com/some/page.php?x=1&y=some%20value",
                )?,
            ],
        )?,
        RuleSet::new(
            "port_number",
            "TCP/UDP port",
            vec![
                must_match("^[0-9]+$", "Only numbers are allowed")?,
                should_match(PORT_SHAPE, "Expected an number between 0 and 65535 (inclusive)")?,
            ],
        )?,
        RuleSet::new(
            "file_name_linux",
            "File name",
            vec![
                not_empty()?,
                must_not_match("/", "Can not contain path separators (slash)")?,
                warn_whitespace()?,
            ],
        )?,
        RuleSet::new(
            "file_name_windows",
            "File name",
            vec![
                not_empty()?,
                must_not_match(r"[/\\]", "Can not contain path separators (slash or backslash)")?,
                must_not_match(r#"[<>:"|?*]"#, WINDOWS_PROHIBITED)?,
                warn_whitespace()?,
            ],
        )?,
        RuleSet::new(
            "path_linux",
            "File path (Linux)",
            vec![not_empty()?, warn_whitespace()?],
        )?,
        RuleSet::new(
            "path_windows",
            "File path (Windows)",
            vec![
                not_empty()?,
                // colon is allowed for drive letters
                should_not_match(
                    r#"[<>"|?*]"#,
                    "Can not contain prohibited characters: '<>\"|?*'",
                )?,
                warn_whitespace()?,
            ],
        )?,
        RuleSet::new(
            "uuid",
            "UUID",
            vec![
                must_match(UUID_SHAPE, "Should look like '123e4567-e89b-12d3-a456-426614174000'")?,
                must_not_match("[^0-9a-fA-F-]", "Can only contain hexadecimal digits and hyphens")?,
            ],
        )?,
        RuleSet::new(
            "mac_address",
            "MAC address",
            vec![must_match(MAC_SHAPE, "Should look like '01:23:45:67:89:AB'")?],
        )?,
        RuleSet::new(
            "email",
            "Email address",
            vec![
                must_match("^[^@]*@[^@]*$", "Must contain exactly one '@' character")?,
                must_match(
                    "@[a-zA-Z0-9.-]+$",
                    "Only letters, numbers, dashes (minus signs), and dots are allowed after the @ sign",
                )?,
                must_match(r"@.+\...+", "Must have a full domain (like 'gmail.com') after the at sign")?,
                must_not_match(r"\s", "Can not contain whitespace")?,
            ],
        )?,
        RuleSet::new(
            "linux_interface",
            "Linux network interface",
            vec![
                should_match(
                    "^[a-z0-9_-]+$",
                    "Should only contain lowercase letters, numbers, underscores, and dashes",
                )?,
                not_empty()?,
            ],
        )?,
    ];
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{evaluate, is_valid_value, ValidationStatus};

    fn status(id: &str, value: &str) -> ValidationStatus {
        let set = preset(id).unwrap();
        evaluate(value, &[set]).status
    }

    #[test]
    fn all_presets_compile() {
        assert!(build_presets().is_ok());
        assert_eq!(presets().len(), 17);
    }

    #[test]
    fn ipv4_presets() {
        assert_eq!(status("ipv4_address", "192.168.0.1"), ValidationStatus::Good);
        assert_eq!(status("ipv4_address", "999.1.1.1"), ValidationStatus::Warning);
        assert_eq!(status("ipv4_address", "localhost"), ValidationStatus::Error);
        assert_eq!(status("ipv4_range_cidr", "10.0.0.0/8"), ValidationStatus::Good);
        assert_eq!(status("ipv4_range_cidr", "10.0.0.0/33"), ValidationStatus::Error);
        assert_eq!(status("ipv4_range_dashes", "10.0.0-3.1-254"), ValidationStatus::Good);
        assert_eq!(status("ipv4_range_dashes", "10.0.0--3.1"), ValidationStatus::Error);
    }

    #[test]
    fn ipv6_preset() {
        assert_eq!(status("ipv6_address", "::1"), ValidationStatus::Good);
        assert_eq!(
            status("ipv6_address", "2001:0db8:85a3:0000:0000:8a2e:0370:7334"),
            ValidationStatus::Good
        );
        assert_eq!(status("ipv6_address", "1.2.3.4"), ValidationStatus::Warning);
        assert_eq!(status("ipv6_address", "g::1"), ValidationStatus::Error);
    }

    #[test]
    fn network_presets() {
        assert_eq!(status("domain", "example.com"), ValidationStatus::Good);
        assert_eq!(status("domain", "localhost"), ValidationStatus::Warning);
        assert_eq!(status("hostname", "-bad"), ValidationStatus::Error);
        assert_eq!(status("url_http", "https://example.com/a?b=c"), ValidationStatus::Good);
        assert_eq!(status("url_http", "ftp://example.com"), ValidationStatus::Error);
        assert_eq!(status("port_number", "8080"), ValidationStatus::Good);
        assert_eq!(status("port_number", "99999"), ValidationStatus::Warning);
        assert_eq!(status("mac_address", "01:23:45:67:89:AB"), ValidationStatus::Good);
        assert_eq!(status("linux_interface", "eth0"), ValidationStatus::Good);
        assert_eq!(status("linux_interface", "Eth 0"), ValidationStatus::Warning);
    }

    #[test]
    fn file_and_misc_presets() {
        assert_eq!(status("file_name_linux", "notes.txt"), ValidationStatus::Good);
        assert_eq!(status("file_name_linux", "a/b"), ValidationStatus::Error);
        assert_eq!(status("file_name_windows", "a:b"), ValidationStatus::Error);
        assert_eq!(status("path_windows", r"C:\Users\me"), ValidationStatus::Good);
        assert_eq!(
            status("uuid", "123e4567-e89b-12d3-a456-426614174000"),
            ValidationStatus::Good
        );
        assert_eq!(status("email", "me@example.com"), ValidationStatus::Good);
        assert_eq!(status("email", "me@@example.com"), ValidationStatus::Error);
    }

    #[test]
    fn warnings_never_block_acceptance() {
        let set = preset("port_number").unwrap();
        assert!(is_valid_value("99999", &[set.clone()]));
        assert!(!is_valid_value("http", &[set]));
    }
}
