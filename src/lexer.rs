use crate::error::Argon2Error;
use crate::params::Algorithm;

use std::str::FromStr;

/// The fields of a `$argon2<type>$v=<version>$<params>$<salt>$<hash>` string, with the salt
/// and hash still base64-encoded.
pub struct TokenizedHash {
    pub v: u32,
    pub alg: Algorithm,
    pub mem_cost_kib: u32,
    pub iterations: u32,
    pub threads: u32,
    pub b64_salt: String,
    pub b64_hash: String,
}

impl FromStr for TokenizedHash {
    type Err = Argon2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('$')
            .ok_or(Argon2Error::InvalidHash("Must begin with $argon2"))?;

        let mut fields = rest.split('$');

        let alg = match fields.next() {
            Some("argon2d") => Algorithm::Argon2d,
            Some("argon2i") => Algorithm::Argon2i,
            Some("argon2id") => Algorithm::Argon2id,
            _ => {
                return Err(Argon2Error::InvalidHash(
                    "Must begin with $argon2d, $argon2i or $argon2id",
                ))
            }
        };

        let v = fields
            .next()
            .and_then(|field| field.strip_prefix("v="))
            .ok_or(Argon2Error::InvalidHash("Missing algorithm version"))?
            .parse::<u32>()
            .map_err(|_| Argon2Error::InvalidHash("Invalid version"))?;

        let params = fields
            .next()
            .ok_or(Argon2Error::InvalidHash("Missing parameters"))?;
        let (mem_cost_kib, iterations, threads) = parse_params(params)?;

        let salt = fields
            .next()
            .ok_or(Argon2Error::InvalidHash("Missing salt"))?;

        let hash = match fields.next() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(Argon2Error::InvalidHash("Missing hash after salt")),
        };

        if fields.next().is_some() {
            return Err(Argon2Error::InvalidHash("Unexpected '$' after hash"));
        }

        Ok(Self {
            v,
            alg,
            mem_cost_kib,
            iterations,
            threads,
            b64_salt: String::from(salt),
            b64_hash: String::from(hash),
        })
    }
}

/// Parses `m=<u32>,t=<u32>,p=<u32>` with the keys in any order, each present exactly once.
fn parse_params(params: &str) -> Result<(u32, u32, u32), Argon2Error> {
    let mut m = None;
    let mut t = None;
    let mut p = None;

    for pair in params.split(',') {
        let (key, value) = pair
            .split_once('=')
            .ok_or(Argon2Error::InvalidHash("Parameter is missing '='"))?;

        let (slot, invalid) = match key {
            "m" => (&mut m, "Invalid m"),
            "t" => (&mut t, "Invalid t"),
            "p" => (&mut p, "Invalid p"),
            _ => return Err(Argon2Error::InvalidHash("Unrecognized parameter")),
        };

        if slot.is_some() {
            return Err(Argon2Error::InvalidHash("Duplicate parameter"));
        }

        *slot = Some(
            value
                .parse::<u32>()
                .map_err(|_| Argon2Error::InvalidHash(invalid))?,
        );
    }

    Ok((
        m.ok_or(Argon2Error::InvalidHash("Missing 'm' parameter"))?,
        t.ok_or(Argon2Error::InvalidHash("Missing 't' parameter"))?,
        p.ok_or(Argon2Error::InvalidHash("Missing 'p' parameter"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(s: &str) -> Argon2Error {
        match TokenizedHash::from_str(s) {
            Ok(_) => panic!("{s} should not tokenize"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_tokenizes_fields() {
        let hash_string = "$argon2d$v=19$p=4,t=2,m=256$c29tZXNhbHQ$PlUse1FQ";
        let tokens = TokenizedHash::from_str(hash_string).unwrap();

        assert_eq!(tokens.alg, Algorithm::Argon2d);
        assert_eq!(tokens.v, 19);
        assert_eq!(tokens.mem_cost_kib, 256);
        assert_eq!(tokens.iterations, 2);
        assert_eq!(tokens.threads, 4);
        assert_eq!(tokens.b64_salt, "c29tZXNhbHQ");
        assert_eq!(tokens.b64_hash, "PlUse1FQ");
    }

    #[test]
    fn test_reports_specific_errors() {
        assert_eq!(
            error_of("argon2d$v=19$m=8,t=1,p=1$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Must begin with $argon2")
        );
        assert_eq!(
            error_of("$argon2d$v=19$m=8,t=1,m=8$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Duplicate parameter")
        );
        assert_eq!(
            error_of("$argon2d$v=19$m=8,t=1,x=1$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Unrecognized parameter")
        );
        assert_eq!(
            error_of("$argon2d$v=19$m=8,t=1$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Missing 'p' parameter")
        );
        assert_eq!(
            error_of("$argon2d$v=19$m=8,t=-1,p=1$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Invalid t")
        );
        assert_eq!(
            error_of("$argon2d$v=19$m=8,t=1,p=1$c29tZXNhbHQ"),
            Argon2Error::InvalidHash("Missing hash after salt")
        );
        assert_eq!(
            error_of("$argon2d$vv=19$m=8,t=1,p=1$c29tZXNhbHQ$AAAA"),
            Argon2Error::InvalidHash("Missing algorithm version")
        );
    }

    #[test]
    fn test_empty_salt_is_tokenized() {
        let hash_string = "$argon2i$v=19$m=8,t=1,p=1$$AAAA";
        let tokens = TokenizedHash::from_str(hash_string).unwrap();
        assert!(tokens.b64_salt.is_empty());
    }
}
