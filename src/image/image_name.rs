//! Container image references: `[repository/]image[:tag][@digest]`.

use super::glob::glob_match;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// ImageName is a parsed container image reference.
///
/// Parsing never fails; parts that are missing from the input are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImageName {
    pub repository: Option<String>,
    pub image: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl ImageName {
    pub fn new(
        repository: Option<&str>,
        image: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Self {
        ImageName {
            repository: repository.and_then(non_empty),
            image: image.to_string(),
            tag: tag.and_then(non_empty),
            digest: digest.and_then(non_empty),
        }
    }

    /// Parses an image reference.
    ///
    /// The digest follows the last `@`; the tag follows a `:` that comes
    /// after the last `/` (so a registry port is never taken for a tag); the
    /// final `/` segment is the image and anything before it the repository.
    pub fn parse(reference: &str) -> ImageName {
        let (rest, digest) = match reference.rfind('@') {
            Some(idx) => (&reference[..idx], non_empty(&reference[idx + 1..])),
            None => (reference, None),
        };

        let last_slash = rest.rfind('/');
        let (rest, tag) = match rest.rfind(':') {
            Some(idx) if last_slash.map_or(true, |slash| idx > slash) => {
                (&rest[..idx], non_empty(&rest[idx + 1..]))
            }
            _ => (rest, None),
        };

        let (repository, image) = match rest.rfind('/') {
            Some(idx) => (non_empty(&rest[..idx]), &rest[idx + 1..]),
            None => (None, rest),
        };

        ImageName {
            repository,
            image: image.to_string(),
            tag,
            digest,
        }
    }

    pub fn has_digest(&self) -> bool {
        self.digest.is_some()
    }

    pub fn with_repository(mut self, repository: Option<&str>) -> Self {
        self.repository = repository.and_then(non_empty);
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.and_then(non_empty);
        self
    }
}

impl FromStr for ImageName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ImageName::parse(s))
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(repository) = &self.repository {
            write!(f, "{}/", repository)?;
        }
        write!(f, "{}", self.image)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// ImagePattern selects image references by glob patterns on their
/// repository, image and tag. An absent pattern behaves like `*`.
///
/// Digests are never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePattern {
    pub repository: Option<String>,
    pub image: Option<String>,
    pub tag: Option<String>,
}

impl ImagePattern {
    pub fn new(repository: Option<&str>, image: Option<&str>, tag: Option<&str>) -> Self {
        ImagePattern {
            repository: repository.map(str::to_string),
            image: image.map(str::to_string),
            tag: tag.map(str::to_string),
        }
    }

    /// Returns true if every part of `name` satisfies its pattern.
    pub fn matches(&self, name: &ImageName) -> bool {
        fn part(pattern: &Option<String>, value: Option<&str>) -> bool {
            match pattern.as_deref() {
                None | Some("*") => true,
                Some(p) => glob_match(p, value.unwrap_or("")),
            }
        }

        part(&self.repository, name.repository.as_deref())
            && part(&self.image, Some(name.image.as_str()))
            && part(&self.tag, name.tag.as_deref())
    }
}

impl fmt::Display for ImagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<String>| p.clone().unwrap_or_else(|| "*".to_string());
        write!(
            f,
            "{}/{}:{}",
            show(&self.repository),
            show(&self.image),
            show(&self.tag)
        )
    }
}
