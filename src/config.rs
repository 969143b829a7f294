//! Loading, merging and saving .npmrc files.
//!
//! An [`NpmrcFile`] is the ordered list of directives classified from a
//! file. Merging is a pure transform that returns a new file; only
//! [`NpmrcFile::save`] touches the disk.

use crate::error::{Error, Result};
use crate::parser::{classify, Directive, DirectiveKind};
use crate::registry::is_artifact_registry;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The classified contents of a single .npmrc file.
#[derive(Debug, Clone, Default)]
pub struct NpmrcFile {
    /// Path to the source file, if loaded from disk.
    pub source: Option<PathBuf>,
    /// Directives in file order.
    pub directives: Vec<Directive>,
}

impl NpmrcFile {
    /// Classify every line of `content`.
    pub fn parse(content: &str) -> Self {
        let directives = content
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let (text, directive) = classify(line);
                if directive.kind() == DirectiveKind::Password && text != line {
                    warn!(
                        line = index + 1,
                        "extra content on password line will not be preserved"
                    );
                }
                directive
            })
            .collect();

        NpmrcFile {
            source: None,
            directives,
        }
    }

    /// Load and classify a file.
    ///
    /// Returns `Err(Error::FileNotFound)` if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut file = Self::parse(&content);
        file.source = Some(path.to_path_buf());
        debug!(
            path = %path.display(),
            directives = file.directives.len(),
            "loaded npmrc file"
        );
        Ok(file)
    }

    /// Load a file, treating a missing file as empty.
    ///
    /// Returns `Err` if the file exists but can't be read.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::FileNotFound(_)) => Ok(NpmrcFile {
                source: Some(path.to_path_buf()),
                directives: Vec::new(),
            }),
            other => other,
        }
    }

    /// Distinct Artifact Registry registries named by registry bindings,
    /// in first-appearance order.
    ///
    /// Bindings built by hand for other hosts are skipped, so a token is
    /// never bound to a registry outside Artifact Registry.
    pub fn registries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.directives
            .iter()
            .filter(|d| d.kind() == DirectiveKind::Registry)
            .filter_map(Directive::registry)
            .filter(|r| is_artifact_registry(r))
            .filter(|r| seen.insert(*r))
            .collect()
    }

    /// Bind `token` to every registry in this file.
    ///
    /// Existing auth tokens for those registries are removed and one new
    /// token line per registry is appended after all other lines. Returns
    /// `Err(Error::NoRegistryFound)` if the file has no registry bindings.
    pub fn add_token(&self, token: &str) -> Result<Self> {
        let registries = self.registries();
        if registries.is_empty() {
            return Err(Error::NoRegistryFound);
        }
        let targets: HashSet<&str> = registries.iter().copied().collect();

        let mut directives: Vec<Directive> = self
            .directives
            .iter()
            .filter(|d| match d {
                Directive::AuthToken { registry, .. } => !targets.contains(registry.as_str()),
                _ => true,
            })
            .cloned()
            .collect();

        for registry in registries {
            debug!(registry, "binding access token");
            directives.push(Directive::auth_token(registry, token));
        }

        Ok(NpmrcFile {
            source: self.source.clone(),
            directives,
        })
    }

    /// Merge `incoming` into this file.
    ///
    /// - Registry bindings replace the binding for the same scope in place.
    /// - Auth tokens and passwords replace the entry for the same registry
    ///   in place; later duplicates of that entry are dropped.
    /// - Opaque lines are matched one-to-one, in order, against identical
    ///   lines of this file that follow the previous match. Unmatched lines
    ///   are appended, so incoming opaque lines keep their relative order
    ///   and repeated lines each keep their own copy.
    ///
    /// Anything without a match is appended in incoming order, so merging
    /// the same input twice is a no-op.
    pub fn merge(&self, incoming: &NpmrcFile) -> Self {
        let mut directives = self.directives.clone();
        // Position of the last opaque line matched or appended.
        let mut cursor: Option<usize> = None;

        for directive in &incoming.directives {
            let Some(key) = MergeKey::of(directive) else {
                let start = cursor.map_or(0, |c| c + 1);
                let found = directives[start..]
                    .iter()
                    .position(|existing| existing == directive)
                    .map(|offset| start + offset);
                cursor = match found {
                    Some(index) => Some(index),
                    None => {
                        directives.push(directive.clone());
                        Some(directives.len() - 1)
                    }
                };
                continue;
            };

            let matches: Vec<usize> = directives
                .iter()
                .enumerate()
                .filter(|(_, existing)| MergeKey::of(existing) == Some(key))
                .map(|(index, _)| index)
                .collect();

            match matches.split_first() {
                None => directives.push(directive.clone()),
                Some((&first, rest)) => {
                    if !rest.is_empty() {
                        warn!(
                            duplicates = rest.len(),
                            "dropping duplicate npmrc entries"
                        );
                    }
                    for &index in rest.iter().rev() {
                        directives.remove(index);
                        if let Some(c) = cursor.as_mut() {
                            if index < *c {
                                *c -= 1;
                            }
                        }
                    }
                    directives[first] = directive.clone();
                }
            }
        }

        NpmrcFile {
            source: self.source.clone(),
            directives,
        }
    }

    /// Render the file as .npmrc text, one directive per line.
    pub fn render(&self) -> String {
        let mut out = self
            .directives
            .iter()
            .map(Directive::to_line)
            .collect::<Vec<_>>()
            .join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Merge this file into the file at `dest` and write the result.
    ///
    /// A missing destination is treated as empty. The new content is written
    /// to a temporary file next to `dest` and renamed over it, so `dest` is
    /// either fully replaced or left untouched.
    pub fn save(&self, dest: &Path) -> Result<NpmrcFile> {
        let merged = self.merged_into(dest)?;
        write_atomic(dest, &merged.render())?;
        info!(path = %dest.display(), "wrote npmrc file");
        Ok(merged)
    }

    /// Compute what [`NpmrcFile::save`] would write to `dest`.
    pub fn merged_into(&self, dest: &Path) -> Result<NpmrcFile> {
        let existing = NpmrcFile::load_or_default(dest)?;
        Ok(existing.merge(self))
    }
}

/// Identity used when merging one file into another. Opaque lines have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeKey<'a> {
    Scope(Option<&'a str>),
    AuthToken(&'a str),
    Password(&'a str),
}

impl<'a> MergeKey<'a> {
    fn of(directive: &'a Directive) -> Option<Self> {
        match directive {
            Directive::Registry { scope, .. } => Some(MergeKey::Scope(scope.as_deref())),
            Directive::AuthToken { registry, .. } => Some(MergeKey::AuthToken(registry)),
            Directive::Password { registry, .. } => Some(MergeKey::Password(registry)),
            Directive::Opaque(_) => None,
        }
    }
}

fn write_atomic(dest: &Path, content: &str) -> Result<()> {
    let write_err = |e: std::io::Error| Error::WriteFile {
        path: dest.to_path_buf(),
        source: e,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PROJECT: &str = "\
@myorg:registry=https://us-npm.pkg.dev/proj/repo/
always-auth=true
";

    #[test]
    fn test_parse_preserves_order() {
        let file = NpmrcFile::parse(PROJECT);
        let kinds: Vec<_> = file.directives.iter().map(Directive::kind).collect();
        assert_eq!(kinds, [DirectiveKind::Registry, DirectiveKind::Opaque]);
    }

    #[test]
    fn test_render_round_trip() {
        let content = "# comment\n\nregistry=https://us-npm.pkg.dev/p/r/\nfoo = bar\n";
        assert_eq!(NpmrcFile::parse(content).render(), content);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(NpmrcFile::default().render(), "");
    }

    #[test]
    fn test_registries_are_distinct() {
        let file = NpmrcFile::parse(
            "@a:registry=https://us-npm.pkg.dev/p/r/\n\
             @b:registry=https://us-npm.pkg.dev/p/r/\n\
             registry=https://eu-npm.pkg.dev/p/other/\n",
        );
        assert_eq!(
            file.registries(),
            ["//us-npm.pkg.dev/p/r/", "//eu-npm.pkg.dev/p/other/"]
        );
    }

    #[test]
    fn test_add_token_appends() {
        let file = NpmrcFile::parse(PROJECT).add_token("abc123").unwrap();
        assert_eq!(
            file.render(),
            "@myorg:registry=https://us-npm.pkg.dev/proj/repo/\n\
             always-auth=true\n\
             //us-npm.pkg.dev/proj/repo/:_authToken=abc123\n"
        );
    }

    #[test]
    fn test_add_token_replaces_existing() {
        let file = NpmrcFile::parse(
            "//us-npm.pkg.dev/proj/repo/:_authToken=old\n\
             @myorg:registry=https://us-npm.pkg.dev/proj/repo/\n\
             //us-npm.pkg.dev/other/repo/:_authToken=keep\n",
        )
        .add_token("new")
        .unwrap();
        assert_eq!(
            file.render(),
            "@myorg:registry=https://us-npm.pkg.dev/proj/repo/\n\
             //us-npm.pkg.dev/other/repo/:_authToken=keep\n\
             //us-npm.pkg.dev/proj/repo/:_authToken=new\n"
        );
    }

    #[test]
    fn test_registries_skip_other_hosts() {
        let file = NpmrcFile {
            source: None,
            directives: vec![
                Directive::Registry {
                    scope: Some("@public".to_string()),
                    registry: "//registry.npmjs.org/".to_string(),
                },
                Directive::Registry {
                    scope: None,
                    registry: "//us-npm.pkg.dev/p/r/".to_string(),
                },
            ],
        };
        assert_eq!(file.registries(), ["//us-npm.pkg.dev/p/r/"]);

        let file = NpmrcFile {
            source: None,
            directives: file.directives[..1].to_vec(),
        };
        assert!(matches!(file.add_token("tok"), Err(Error::NoRegistryFound)));
    }

    #[test]
    fn test_add_token_no_registry() {
        let result = NpmrcFile::parse("always-auth=true\n").add_token("abc");
        assert!(matches!(result, Err(Error::NoRegistryFound)));
    }

    #[test]
    fn test_merge_replaces_in_place() {
        let existing = NpmrcFile::parse(
            "//us-npm.pkg.dev/proj/repo/:_authToken=stale\n\
             color=false\n",
        );
        let incoming = NpmrcFile::parse("//us-npm.pkg.dev/proj/repo/:_authToken=fresh\n");
        assert_eq!(
            existing.merge(&incoming).render(),
            "//us-npm.pkg.dev/proj/repo/:_authToken=fresh\ncolor=false\n"
        );
    }

    #[test]
    fn test_merge_drops_duplicates() {
        let existing = NpmrcFile::parse(
            "//us-npm.pkg.dev/proj/repo/:_authToken=one\n\
             x=1\n\
             //us-npm.pkg.dev/proj/repo/:_authToken=two\n",
        );
        let incoming = NpmrcFile::parse("//us-npm.pkg.dev/proj/repo/:_authToken=three\n");
        assert_eq!(
            existing.merge(&incoming).render(),
            "//us-npm.pkg.dev/proj/repo/:_authToken=three\nx=1\n"
        );
    }

    #[test]
    fn test_merge_scope_rebinding() {
        let existing = NpmrcFile::parse("@myorg:registry=https://us-npm.pkg.dev/old/repo/\n");
        let incoming = NpmrcFile::parse("@myorg:registry=https://us-npm.pkg.dev/new/repo/\n");
        assert_eq!(
            existing.merge(&incoming).render(),
            "@myorg:registry=https://us-npm.pkg.dev/new/repo/\n"
        );
    }

    #[test]
    fn test_merge_opaque_not_duplicated() {
        let existing = NpmrcFile::parse("always-auth=true\n");
        let incoming = NpmrcFile::parse("always-auth=true\nfund=false\n");
        assert_eq!(
            existing.merge(&incoming).render(),
            "always-auth=true\nfund=false\n"
        );
    }

    #[test]
    fn test_merge_keeps_incoming_repeated_lines() {
        let incoming = NpmrcFile::parse("# a\n\nx=1\n\n# a\n");
        let merged = NpmrcFile::default().merge(&incoming);
        assert_eq!(merged.render(), "# a\n\nx=1\n\n# a\n");
        assert_eq!(merged.merge(&incoming).render(), merged.render());
    }

    #[test]
    fn test_merge_keeps_incoming_opaque_order() {
        let existing = NpmrcFile::parse("save-exact=true\n");
        let incoming = NpmrcFile::parse("fund=false\nsave-exact=true\n");
        let merged = existing.merge(&incoming);
        assert_eq!(
            merged.render(),
            "save-exact=true\nfund=false\nsave-exact=true\n"
        );
        assert_eq!(merged.merge(&incoming).render(), merged.render());
    }

    #[test]
    fn test_merge_cursor_survives_duplicate_removal() {
        let existing = NpmrcFile::parse(
            "//us-npm.pkg.dev/p/r/:_authToken=one\n\
             //us-npm.pkg.dev/p/r/:_authToken=two\n\
             a=1\n\
             b=2\n",
        );
        let incoming = NpmrcFile::parse(
            "a=1\n\
             //us-npm.pkg.dev/p/r/:_authToken=three\n\
             b=2\n",
        );
        assert_eq!(
            existing.merge(&incoming).render(),
            "//us-npm.pkg.dev/p/r/:_authToken=three\na=1\nb=2\n"
        );
    }

    #[test]
    fn test_merge_keeps_repeated_opaque_lines() {
        let existing = NpmrcFile::parse("a=1\n\n\nb=2\n");
        let incoming = NpmrcFile::parse("\n");
        assert_eq!(existing.merge(&incoming).render(), "a=1\n\n\nb=2\n");
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".npmrc");

        match NpmrcFile::load(&path) {
            Err(Error::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }

        let file = NpmrcFile::load_or_default(&path).unwrap();
        assert!(file.directives.is_empty());
    }

    #[test]
    fn test_save_creates_file() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("home").join(".npmrc");

        let config = NpmrcFile::parse(PROJECT).add_token("abc123").unwrap();
        config.save(&dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), config.render());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join(".npmrc");
        NpmrcFile::parse(PROJECT).save(&dest).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
