//! Typed DNS record model.
//!
//! A [`Record`] is validated at construction: the shape of
//! [`RecordData`] depends on the [`RecordType`] (A/AAAA values must parse
//! as IP address literals and are stored canonicalized; everything else is
//! a non-empty string). Unrecognized record types and classes are hard
//! errors; there is deliberately no permissive fallback here, unlike
//! [`Status`][crate::relation::request::Status] parsing.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Default TTL for challenge records created from write notices.
pub const CHALLENGE_TTL: u32 = 600;

/// Record validation errors.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("record {0} must not be empty")]
    EmptyField(&'static str),

    #[error("unrecognized record type \"{0}\"")]
    UnknownType(String),

    #[error("unrecognized record class \"{0}\"")]
    UnknownClass(String),

    #[error("record TTL \"{0}\" is not a positive integer")]
    InvalidTtl(String),

    #[error("record data for {0} records must be an IP address literal: \"{1}\"")]
    InvalidAddress(RecordType, String),
}

/// DNS record class. Only `IN` is in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecordClass {
    #[default]
    In,
}

impl FromStr for RecordClass {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(RecordClass::In),
            other => Err(RecordError::UnknownClass(other.to_string())),
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::In => f.write_str("IN"),
        }
    }
}

macro_rules! record_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// DNS record types accepted on the relation channel.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RecordType {
            $($variant),+
        }

        impl FromStr for RecordType {
            type Err = RecordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(RecordType::$variant),)+
                    other => Err(RecordError::UnknownType(other.to_string())),
                }
            }
        }

        impl fmt::Display for RecordType {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(RecordType::$variant => f.write_str($name)),+
                }
            }
        }
    };
}

record_types! {
    A => "A",
    Aaaa => "AAAA",
    Cname => "CNAME",
    Mx => "MX",
    Dkim => "DKIM",
    Spf => "SPF",
    Dmarc => "DMARC",
    Txt => "TXT",
    Caa => "CAA",
    Srv => "SRV",
    Svcb => "SVCB",
    Https => "HTTPS",
    Ptr => "PTR",
    Soa => "SOA",
    Ns => "NS",
    Ds => "DS",
    Dnskey => "DNSKEY",
}

/// Validated record data.
///
/// Address data is kept parsed so it serializes in canonical form
/// (`001.2.3.4` never survives, `0:0:0:0:0:0:0:1` becomes `::1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordData {
    Addr(IpAddr),
    Text(String),
}

impl RecordData {
    /// Validate raw data against the record type it accompanies.
    ///
    /// For A/AAAA the value is parsed as IPv4 first, then IPv6. All other
    /// types accept any non-empty string.
    pub fn validate(record_type: RecordType, raw: &str) -> Result<Self, RecordError> {
        match record_type {
            RecordType::A | RecordType::Aaaa => {
                if let Ok(v4) = raw.parse::<Ipv4Addr>() {
                    return Ok(RecordData::Addr(IpAddr::V4(v4)));
                }
                match raw.parse::<Ipv6Addr>() {
                    Ok(v6) => Ok(RecordData::Addr(IpAddr::V6(v6))),
                    Err(_) => Err(RecordError::InvalidAddress(record_type, raw.to_string())),
                }
            }
            _ if raw.is_empty() => Err(RecordError::EmptyField("data")),
            _ => Ok(RecordData::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::Addr(addr) => addr.fmt(f),
            RecordData::Text(text) => f.write_str(text),
        }
    }
}

/// A single DNS record, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub domain: String,
    pub host_label: String,
    pub ttl: u32,
    pub record_class: RecordClass,
    pub record_type: RecordType,
    pub record_data: RecordData,
}

impl Record {
    /// Build a record, validating the data shape against the record type.
    pub fn new(
        domain: &str,
        host_label: &str,
        ttl: u32,
        record_class: RecordClass,
        record_type: RecordType,
        record_data: &str,
    ) -> Result<Self, RecordError> {
        if domain.is_empty() {
            return Err(RecordError::EmptyField("domain"));
        }
        if host_label.is_empty() {
            return Err(RecordError::EmptyField("host_label"));
        }
        if ttl == 0 {
            return Err(RecordError::InvalidTtl(ttl.to_string()));
        }
        Ok(Record {
            domain: domain.to_string(),
            host_label: host_label.to_string(),
            ttl,
            record_class,
            record_type,
            record_data: RecordData::validate(record_type, record_data)?,
        })
    }

    /// The FQDN this record addresses (`host_label.domain`).
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.host_label, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_record_accepts_and_canonicalizes_ipv4() {
        let record = Record::new("example.com", "www", 300, RecordClass::In, RecordType::A, "1.1.1.1")
            .unwrap();
        assert_eq!(record.record_data.to_string(), "1.1.1.1");
    }

    #[test]
    fn a_record_rejects_out_of_range_octets() {
        let err =
            Record::new("example.com", "www", 300, RecordClass::In, RecordType::A, "300.1.1.1")
                .unwrap_err();
        assert!(matches!(err, RecordError::InvalidAddress(RecordType::A, _)));
    }

    #[test]
    fn aaaa_record_accepts_and_canonicalizes_ipv6() {
        let record = Record::new(
            "example.com",
            "www",
            300,
            RecordClass::In,
            RecordType::Aaaa,
            "0:0:0:0:0:0:0:1",
        )
        .unwrap();
        assert_eq!(record.record_data.to_string(), "::1");

        assert!(Record::new(
            "example.com",
            "www",
            300,
            RecordClass::In,
            RecordType::Aaaa,
            "::1"
        )
        .is_ok());
    }

    #[test]
    fn txt_record_accepts_any_nonempty_string() {
        let record = Record::new(
            "example.com",
            "_acme-challenge",
            600,
            RecordClass::In,
            RecordType::Txt,
            "tok123",
        )
        .unwrap();
        assert_eq!(record.record_data, RecordData::Text("tok123".to_string()));
        assert_eq!(record.fqdn(), "_acme-challenge.example.com");
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            Record::new("", "www", 300, RecordClass::In, RecordType::Txt, "x"),
            Err(RecordError::EmptyField("domain"))
        ));
        assert!(matches!(
            Record::new("example.com", "", 300, RecordClass::In, RecordType::Txt, "x"),
            Err(RecordError::EmptyField("host_label"))
        ));
        assert!(matches!(
            Record::new("example.com", "www", 300, RecordClass::In, RecordType::Txt, ""),
            Err(RecordError::EmptyField("data"))
        ));
    }

    #[test]
    fn record_type_parsing_is_strict() {
        assert_eq!("TXT".parse::<RecordType>().unwrap(), RecordType::Txt);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!(matches!(
            "TYPE65280".parse::<RecordType>(),
            Err(RecordError::UnknownType(_))
        ));
        // Lowercase is not the wire form.
        assert!("txt".parse::<RecordType>().is_err());
    }

    #[test]
    fn record_class_parsing_is_strict() {
        assert_eq!("IN".parse::<RecordClass>().unwrap(), RecordClass::In);
        assert!(matches!(
            "CH".parse::<RecordClass>(),
            Err(RecordError::UnknownClass(_))
        ));
    }
}
