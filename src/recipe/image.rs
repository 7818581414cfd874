//! Container image recipes.

use super::config::string_list;
use super::{rewrite_scalars, select, Recipe, RecipeError, Visit};
use crate::fieldpath::Cursor;
use crate::image::{ImageName, ImagePattern};
use crate::merge::{flag_matches, Findings};
use crate::model::{is_container_image, Document};
use crate::value::Node;
use serde::Deserialize;
use tracing::debug;

/// Returns the image scalars of every container, with their parsed names.
fn container_images(root: &Node, include_init: bool) -> Vec<(Cursor<'_>, ImageName)> {
    select(root, |c| is_container_image(c, include_init))
        .into_iter()
        .filter_map(|c| {
            let name = ImageName::parse(c.node().as_str()?);
            Some((c, name))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindImageOptions {
    #[serde(default)]
    pub repository: Option<String>,
    pub image_name: String,
    #[serde(default)]
    pub image_tag: Option<String>,
}

impl FindImageOptions {
    pub fn build(self) -> Result<FindImage, RecipeError> {
        Ok(FindImage {
            pattern: ImagePattern::new(
                self.repository.as_deref(),
                Some(&self.image_name),
                self.image_tag.as_deref(),
            ),
        })
    }
}

/// FindImage flags container images, init containers included, that match
/// a repository/image/tag pattern.
#[derive(Debug, Clone)]
pub struct FindImage {
    pattern: ImagePattern,
}

impl Recipe for FindImage {
    fn name(&self) -> &'static str {
        "find-image"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let cursors: Vec<_> = container_images(document.root(), true)
            .into_iter()
            .filter(|(_, name)| self.pattern.matches(name))
            .map(|(c, _)| c)
            .collect();
        let message = self.pattern.to_string();
        Ok(Visit::found(flag_matches(&cursors, |_| {
            Some(message.clone())
        })))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindDisallowedImageTagsOptions {
    #[serde(deserialize_with = "string_list")]
    pub disallowed_tags: Vec<String>,
    #[serde(default)]
    pub include_init_containers: bool,
}

impl FindDisallowedImageTagsOptions {
    pub fn build(self) -> Result<FindDisallowedImageTags, RecipeError> {
        if self.disallowed_tags.is_empty() {
            return Err(RecipeError::invalid_option(
                "disallowedTags",
                "at least one tag is required",
            ));
        }
        Ok(FindDisallowedImageTags {
            tags: self.disallowed_tags,
            include_init: self.include_init_containers,
        })
    }
}

/// FindDisallowedImageTags flags container images whose tag is on a deny
/// list.
#[derive(Debug, Clone)]
pub struct FindDisallowedImageTags {
    tags: Vec<String>,
    include_init: bool,
}

impl Recipe for FindDisallowedImageTags {
    fn name(&self) -> &'static str {
        "find-disallowed-image-tags"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let mut findings = Findings::new();
        for (cursor, name) in container_images(document.root(), self.include_init) {
            let found: Vec<&str> = self
                .tags
                .iter()
                .map(String::as_str)
                .filter(|t| name.tag.as_deref() == Some(*t))
                .collect();
            if !found.is_empty() {
                findings.flag(
                    cursor.path(),
                    format!("disallowed tag: [{}]", found.join(", ")),
                );
            }
        }
        Ok(Visit::found(findings))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMissingDigestOptions {
    #[serde(default)]
    pub include_init_containers: bool,
}

impl FindMissingDigestOptions {
    pub fn build(self) -> Result<FindMissingDigest, RecipeError> {
        Ok(FindMissingDigest {
            include_init: self.include_init_containers,
        })
    }
}

/// FindMissingDigest flags container images not pinned by digest.
#[derive(Debug, Clone)]
pub struct FindMissingDigest {
    include_init: bool,
}

impl Recipe for FindMissingDigest {
    fn name(&self) -> &'static str {
        "find-missing-digest"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let cursors: Vec<_> = container_images(document.root(), self.include_init)
            .into_iter()
            .filter(|(_, name)| !name.has_digest())
            .map(|(c, _)| c)
            .collect();
        Ok(Visit::found(flag_matches(&cursors, |_| {
            Some("missing digest".to_string())
        })))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContainerImageNameOptions {
    #[serde(default)]
    pub repo_to_find: Option<String>,
    pub image_to_find: String,
    #[serde(default)]
    pub tag_to_find: Option<String>,
    #[serde(default)]
    pub repo_to_update: Option<String>,
    #[serde(default)]
    pub image_to_update: Option<String>,
    #[serde(default)]
    pub tag_to_update: Option<String>,
    #[serde(default)]
    pub include_init_containers: bool,
}

impl UpdateContainerImageNameOptions {
    pub fn build(self) -> Result<UpdateContainerImageName, RecipeError> {
        let pattern = ImagePattern::new(
            self.repo_to_find.as_deref(),
            Some(&self.image_to_find),
            self.tag_to_find.as_deref(),
        );
        Ok(UpdateContainerImageName {
            pattern,
            repository: self.repo_to_update,
            image: self.image_to_update,
            tag: self.tag_to_update,
            include_init: self.include_init_containers,
        })
    }
}

/// UpdateContainerImageName replaces parts of matching container images.
///
/// Only the parts that were given are replaced; the digest is carried over.
#[derive(Debug, Clone)]
pub struct UpdateContainerImageName {
    pattern: ImagePattern,
    repository: Option<String>,
    image: Option<String>,
    tag: Option<String>,
    include_init: bool,
}

impl UpdateContainerImageName {
    fn update(&self, mut name: ImageName) -> ImageName {
        if let Some(repository) = &self.repository {
            name = name.with_repository(Some(repository));
        }
        if let Some(image) = &self.image {
            name = name.with_image(image);
        }
        if let Some(tag) = &self.tag {
            name = name.with_tag(Some(tag));
        }
        name
    }
}

impl Recipe for UpdateContainerImageName {
    fn name(&self) -> &'static str {
        "update-container-image-name"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let edits: Vec<_> = container_images(document.root(), self.include_init)
            .into_iter()
            .filter(|(_, name)| self.pattern.matches(name))
            .map(|(cursor, name)| {
                let updated = self.update(name).to_string();
                debug!(path = %cursor.path(), image = %updated, "updating image");
                (cursor.path(), updated)
            })
            .collect();
        Ok(match rewrite_scalars(document.root(), edits) {
            Some(root) => Visit::changed(root),
            None => Visit::unchanged(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{from_yaml, to_yaml};
    use pretty_assertions::assert_eq;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      initContainers:
      - name: init
        image: busybox:latest
      containers:
      - name: web
        image: gcr.io/team/nginx:latest
      - name: sidecar
        image: envoy:v1.2@sha256:abc
"#;

    fn deployment() -> Document {
        Document::new(from_yaml(DEPLOYMENT).unwrap())
    }

    #[test]
    fn test_find_image() {
        let find = |repository: Option<&str>, image: &str, tag: Option<&str>| {
            FindImageOptions {
                repository: repository.map(str::to_string),
                image_name: image.to_string(),
                image_tag: tag.map(str::to_string),
            }
            .build()
            .unwrap()
            .visit(&deployment())
            .unwrap()
            .findings
            .to_string()
        };

        assert_eq!(
            find(None, "nginx", None),
            "$.spec.template.spec.containers[0].image: */nginx:*"
        );
        assert_eq!(
            find(Some("gcr.io/*"), "*", Some("latest")),
            "$.spec.template.spec.containers[0].image: gcr.io/*/*:latest"
        );
        // Init containers are always searched.
        assert_eq!(
            find(None, "busybox", None),
            "$.spec.template.spec.initContainers[0].image: */busybox:*"
        );
        assert_eq!(find(None, "redis", None), "");
    }

    #[test]
    fn test_find_disallowed_image_tags() {
        let recipe = |include_init| {
            FindDisallowedImageTagsOptions {
                disallowed_tags: vec!["latest".to_string(), "dev".to_string()],
                include_init_containers: include_init,
            }
            .build()
            .unwrap()
        };
        assert_eq!(
            recipe(false).visit(&deployment()).unwrap().findings.to_string(),
            "$.spec.template.spec.containers[0].image: disallowed tag: [latest]"
        );
        assert_eq!(recipe(true).visit(&deployment()).unwrap().findings.len(), 2);

        let empty = FindDisallowedImageTagsOptions {
            disallowed_tags: vec![],
            include_init_containers: false,
        };
        assert!(empty.build().is_err());
    }

    #[test]
    fn test_find_missing_digest() {
        let visit = FindMissingDigestOptions::default()
            .build()
            .unwrap()
            .visit(&deployment())
            .unwrap();
        assert_eq!(
            visit.findings.to_string(),
            "$.spec.template.spec.containers[0].image: missing digest"
        );
    }

    #[test]
    fn test_update_container_image_name() {
        let recipe = UpdateContainerImageNameOptions {
            repo_to_find: None,
            image_to_find: "*".to_string(),
            tag_to_find: None,
            repo_to_update: Some("registry.local/mirror".to_string()),
            image_to_update: None,
            tag_to_update: Some("1.0".to_string()),
            include_init_containers: false,
        }
        .build()
        .unwrap();

        let root = recipe.visit(&deployment()).unwrap().root.unwrap();
        let out = to_yaml(&root).unwrap();
        assert!(out.contains("image: registry.local/mirror/nginx:1.0\n"), "{}", out);
        assert!(out.contains("image: registry.local/mirror/envoy:1.0@sha256:abc\n"), "{}", out);
        assert!(out.contains("image: busybox:latest\n"), "{}", out);

        assert!(!recipe.visit(&Document::new(root)).unwrap().is_changed());
    }

    #[test]
    fn test_update_only_matching_images() {
        let recipe = UpdateContainerImageNameOptions {
            repo_to_find: None,
            image_to_find: "nginx".to_string(),
            tag_to_find: Some("latest".to_string()),
            repo_to_update: None,
            image_to_update: Some("nginx-unprivileged".to_string()),
            tag_to_update: None,
            include_init_containers: true,
        }
        .build()
        .unwrap();
        let root = recipe.visit(&deployment()).unwrap().root.unwrap();
        let out = to_yaml(&root).unwrap();
        assert!(out.contains("image: gcr.io/team/nginx-unprivileged:latest\n"));
        assert!(out.contains("image: envoy:v1.2@sha256:abc\n"));
    }
}
