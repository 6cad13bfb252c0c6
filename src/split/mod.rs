//! Document-scoped splitting sessions.
//!
//! A [`SplitSession`] owns one opened document, resolves its outline once and
//! then extracts or renders any subset of sections, sharing indexed pages
//! between them.
//!
//! # Example
//!
//! ```no_run
//! use pdfsplit::split::{SectionSelection, Splitter};
//!
//! fn main() -> pdfsplit::Result<()> {
//!     let session = Splitter::new().open("datasheet.pdf")?;
//!     for spec in session.sections() {
//!         println!("{}", spec);
//!     }
//!
//!     let run = session.render_selected(&SectionSelection::parse("1,3-4")?);
//!     for section in &run.sections {
//!         println!("{} ({} tables)", section.file_name, section.table_count);
//!     }
//!     Ok(())
//! }
//! ```

mod options;
mod result;
mod selection;

pub use options::{OutlinePolicy, SplitOptions};
pub use result::{ExtractionRun, RenderedSection, SectionFailure, SplitRun};
pub use selection::SectionSelection;

use std::path::Path;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{SectionDocument, SectionGroup, SectionScope, SectionSpec};
use crate::parser::{
    max_level, merge_by_level, LopdfBackend, OutlineResolver, PageCache, PdfBackend,
    SectionExtractor,
};
use crate::render::{FileNamer, MarkdownRenderer};

const DEFAULT_TITLE: &str = "Document";

/// Opens documents into [`SplitSession`]s.
#[derive(Debug, Clone, Default)]
pub struct Splitter {
    options: SplitOptions,
}

impl Splitter {
    /// Create a splitter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a splitter with the given options.
    pub fn with_options(options: SplitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Open a PDF file.
    ///
    /// The file stem names the whole-document section when the document
    /// has no title of its own.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<SplitSession<LopdfBackend>> {
        let path = path.as_ref();
        let backend = LopdfBackend::load_file(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        let mut session = self.session(backend, stem.as_deref())?;
        session.source = Some(path.display().to_string());
        Ok(session)
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(&self, data: &[u8]) -> Result<SplitSession<LopdfBackend>> {
        self.session(LopdfBackend::load_bytes(data)?, None)
    }

    /// Use an already opened backend.
    pub fn with_backend<B: PdfBackend>(&self, backend: B) -> Result<SplitSession<B>> {
        self.session(backend, None)
    }

    fn session<B: PdfBackend>(&self, backend: B, fallback_title: Option<&str>) -> Result<SplitSession<B>> {
        let (sections, whole_document) = match OutlineResolver::resolve(&backend) {
            Ok(sections) => (sections, false),
            Err(Error::MalformedOutline(reason))
                if self.options.outline_policy == OutlinePolicy::WholeDocument =>
            {
                let title = backend
                    .title()
                    .filter(|t| !t.trim().is_empty())
                    .or_else(|| fallback_title.map(str::to_string))
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());
                log::warn!("{}; treating the document as one section '{}'", reason, title);
                (OutlineResolver::whole_document(&backend, &title)?, true)
            }
            Err(e) => return Err(e),
        };

        let cache = PageCache::new(backend.page_count());
        Ok(SplitSession {
            backend,
            options: self.options.clone(),
            sections,
            cache,
            whole_document,
            source: None,
        })
    }
}

/// One opened document with its resolved sections.
///
/// The backend is released when the session is dropped.
pub struct SplitSession<B: PdfBackend> {
    backend: B,
    options: SplitOptions,
    sections: Vec<SectionSpec>,
    cache: PageCache,
    whole_document: bool,
    source: Option<String>,
}

impl<B: PdfBackend> SplitSession<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Resolved sections in document order.
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Deepest 1-based outline level.
    pub fn max_level(&self) -> usize {
        max_level(&self.sections)
    }

    /// Whether the outline was replaced by a single whole-document section.
    pub fn is_whole_document(&self) -> bool {
        self.whole_document
    }

    /// Path the document was opened from, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Look up a section by index.
    pub fn section(&self, index: usize) -> Result<&SectionSpec> {
        self.sections
            .get(index)
            .ok_or_else(|| Error::SectionNotFound(format!("#{}", index + 1)))
    }

    /// Number of pages indexed so far.
    pub fn indexed_pages(&self) -> usize {
        self.cache.indexed_pages()
    }

    /// Extract one section with the configured scope.
    pub fn extract(&self, index: usize) -> Result<SectionDocument> {
        let spec = self.section(index)?;
        self.extractor().extract(spec)
    }

    /// Extract the selected sections.
    ///
    /// A failing section is recorded and does not stop the others.
    pub fn extract_selected(&self, selection: &SectionSelection) -> ExtractionRun {
        let (indices, missing) = selection.resolve(&self.sections);
        let mut run = ExtractionRun {
            failures: missing.iter().map(SectionFailure::unmatched).collect(),
            ..Default::default()
        };

        let results = self.map_indices(&indices, |i| {
            let spec = &self.sections[i];
            self.extractor().extract(spec).map_err(|e| SectionFailure::new(spec, &e))
        });
        for result in results {
            match result {
                Ok(doc) => run.documents.push(doc),
                Err(failure) => {
                    log::warn!("Section '{}' failed: {}", failure.title, failure.reason);
                    run.failures.push(failure);
                }
            }
        }
        run
    }

    /// Group sections by split level; `None` keeps every section separate.
    pub fn groups(&self, split_level: Option<usize>) -> Vec<SectionGroup> {
        merge_by_level(&self.sections, split_level)
    }

    /// Render one section to Markdown.
    pub fn render_section(&self, index: usize) -> Result<String> {
        let doc = self.extract(index)?;
        Ok(self.renderer()?.render(&doc))
    }

    /// Groups that contain at least one selected section, plus failures for
    /// selection entries that matched nothing.
    pub fn selected_groups(&self, selection: &SectionSelection) -> (Vec<SectionGroup>, Vec<SectionFailure>) {
        let (indices, missing) = selection.resolve(&self.sections);
        let groups = self
            .groups(self.options.split_level)
            .into_iter()
            .filter(|g| g.members().any(|m| indices.binary_search(&m.index).is_ok()))
            .collect();
        (groups, missing.iter().map(SectionFailure::unmatched).collect())
    }

    /// Render the selected sections, one file per group.
    pub fn render_selected(&self, selection: &SectionSelection) -> SplitRun {
        self.render_selected_with(selection, |_| {})
    }

    /// Like [`render_selected`](Self::render_selected), calling `progress`
    /// after each group finishes.
    pub fn render_selected_with<F>(&self, selection: &SectionSelection, progress: F) -> SplitRun
    where
        F: Fn(&SectionSpec) + Sync,
    {
        let (groups, mut failures) = self.selected_groups(selection);
        let mut run = self.render_groups_with(&groups, progress);
        failures.append(&mut run.failures);
        run.failures = failures;
        run
    }

    /// Render already selected groups, one file per group.
    pub fn render_groups_with<F>(&self, groups: &[SectionGroup], progress: F) -> SplitRun
    where
        F: Fn(&SectionSpec) + Sync,
    {
        let mut failures = Vec::new();
        let mut run = SplitRun {
            source: self.source.clone(),
            page_count: self.page_count(),
            section_count: self.sections.len(),
            whole_document: self.whole_document,
            ..Default::default()
        };

        let renderer = match self.renderer() {
            Ok(r) => r,
            Err(e) => {
                failures.extend(groups.iter().map(|g| SectionFailure::new(&g.parent, &e)));
                run.failures = failures;
                return run;
            }
        };

        // Merged groups always take each member's own content so that a
        // parent does not repeat its children.
        let scope = if self.options.split_level.is_some() {
            SectionScope::OwnContent
        } else {
            self.options.extract.scope
        };

        let positions: Vec<usize> = (0..groups.len()).collect();
        let results = self.map_indices(&positions, |i| {
            let group = &groups[i];
            let result = self.render_group(group, scope, &renderer);
            progress(&group.parent);
            result
        });

        let mut namer = FileNamer::new(self.options.numbered_files);
        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok((markdown, table_count)) => run.sections.push(RenderedSection {
                    index: group.parent.index,
                    title: group.parent.title.clone(),
                    depth: group.parent.depth,
                    members: group.len(),
                    file_name: namer.name_for(&group.parent, group.parent.index + 1),
                    table_count,
                    markdown,
                }),
                Err(failure) => {
                    log::warn!("Section '{}' failed: {}", failure.title, failure.reason);
                    failures.push(failure);
                }
            }
        }
        run.failures = failures;

        log::info!(
            "Rendered {} file(s), {} failure(s), {} of {} pages indexed",
            run.sections.len(),
            run.failures.len(),
            self.cache.indexed_pages(),
            self.page_count()
        );
        run
    }

    fn render_group(
        &self,
        group: &SectionGroup,
        scope: SectionScope,
        renderer: &MarkdownRenderer,
    ) -> std::result::Result<(String, usize), SectionFailure> {
        let extractor = self.extractor();
        let mut docs = Vec::with_capacity(group.len());
        for spec in group.members() {
            let doc = extractor
                .extract_with_scope(spec, scope)
                .map_err(|e| SectionFailure::new(spec, &e))?;
            docs.push(doc);
        }
        let tables = docs.iter().map(|d| d.tables().count()).sum();
        Ok((renderer.render_group(&docs), tables))
    }

    fn extractor(&self) -> SectionExtractor<'_, B> {
        SectionExtractor::new(&self.backend, &self.cache, &self.options.extract)
    }

    fn renderer(&self) -> Result<MarkdownRenderer> {
        MarkdownRenderer::new(self.options.render.clone())
    }

    /// Map over indices on the rayon pool or sequentially; output keeps
    /// input order.
    fn map_indices<T, F>(&self, indices: &[usize], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        if self.options.parallel && indices.len() > 1 {
            indices.par_iter().map(|&i| f(i)).collect()
        } else {
            indices.iter().map(|&i| f(i)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bookmark;
    use crate::parser::{MemoryBackend, MemoryPage};

    fn page() -> MemoryPage {
        MemoryPage::new(600.0, 800.0)
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_page(
                page()
                    .text(72.0, 60.0, 14.0, "1 Introduction")
                    .text(72.0, 100.0, 10.0, "Intro text.")
                    .text(72.0, 200.0, 12.0, "1.1 Scope")
                    .text(72.0, 240.0, 10.0, "Scope text.")
                    .text(300.0, 770.0, 10.0, "1"),
            )
            .with_page(
                page()
                    .text(72.0, 60.0, 14.0, "2 Registers")
                    .text(72.0, 120.0, 10.0, "Name")
                    .text(200.0, 120.0, 10.0, "Offset")
                    .text(72.0, 135.0, 10.0, "CTRL")
                    .text(200.0, 135.0, 10.0, "0x00")
                    .text(72.0, 150.0, 10.0, "STAT")
                    .text(200.0, 150.0, 10.0, "0x04"),
            )
            .with_bookmarks([
                Bookmark::new("1 Introduction", 0, 0, Some(55.0)),
                Bookmark::new("1.1 Scope", 1, 0, Some(195.0)),
                Bookmark::new("2 Registers", 0, 1, Some(55.0)),
            ])
    }

    #[test]
    fn test_session_lists_sections() {
        let session = Splitter::new().with_backend(backend()).unwrap();
        let titles: Vec<&str> = session.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["1 Introduction", "1.1 Scope", "2 Registers"]);
        assert_eq!(session.max_level(), 2);
        assert!(!session.is_whole_document());
        assert!(matches!(session.section(7), Err(Error::SectionNotFound(_))));
    }

    #[test]
    fn test_render_all_sections() {
        let session = Splitter::with_options(SplitOptions::new().sequential())
            .with_backend(backend())
            .unwrap();
        let run = session.render_selected(&SectionSelection::All);

        assert!(run.is_complete());
        let names: Vec<&str> = run.sections.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["001_1_Introduction.md", "002_1.1_Scope.md", "003_2_Registers.md"]
        );
        assert_eq!(run.sections[0].markdown, "# 1 Introduction\n\nIntro text.\n");
        assert_eq!(run.sections[1].markdown, "## 1.1 Scope\n\nScope text.\n");
        assert_eq!(
            run.sections[2].markdown,
            "# 2 Registers\n\n| Name | Offset |\n| --- | --- |\n| CTRL | 0x00 |\n| STAT | 0x04 |\n"
        );
        assert_eq!(run.table_count(), 1);
    }

    #[test]
    fn test_child_text_written_once_by_default() {
        let run = Splitter::new()
            .with_backend(backend())
            .unwrap()
            .render_selected(&SectionSelection::All);
        let holders: Vec<&str> = run
            .sections
            .iter()
            .filter(|s| s.markdown.contains("Scope text."))
            .map(|s| s.file_name.as_str())
            .collect();
        assert_eq!(holders, vec!["002_1.1_Scope.md"]);

        let subtree = Splitter::with_options(SplitOptions::new().with_scope(SectionScope::Subtree))
            .with_backend(backend())
            .unwrap()
            .render_selected(&SectionSelection::All);
        assert!(subtree.sections[0].markdown.contains("Scope text."));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Splitter::with_options(SplitOptions::new().sequential())
            .with_backend(backend())
            .unwrap()
            .render_selected(&SectionSelection::All);
        let parallel = Splitter::new()
            .with_backend(backend())
            .unwrap()
            .render_selected(&SectionSelection::All);
        assert_eq!(sequential.sections, parallel.sections);
    }

    #[test]
    fn test_split_level_merges_children() {
        let session = Splitter::with_options(SplitOptions::new().with_split_level(1))
            .with_backend(backend())
            .unwrap();
        let run = session.render_selected(&SectionSelection::All);

        assert_eq!(run.sections.len(), 2);
        assert_eq!(run.sections[0].members, 2);
        assert_eq!(
            run.sections[0].markdown,
            "# 1 Introduction\n\nIntro text.\n\n## 1.1 Scope\n\nScope text.\n"
        );
        assert_eq!(run.sections[1].file_name, "003_2_Registers.md");
    }

    #[test]
    fn test_selection_with_missing_entries() {
        let session = Splitter::new().with_backend(backend()).unwrap();
        let run = session.render_selected(&SectionSelection::Indices(vec![2, 11]));
        assert_eq!(run.sections.len(), 1);
        assert_eq!(run.sections[0].title, "2 Registers");
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].index, None);
        assert!(!run.is_complete());
    }

    #[test]
    fn test_extract_selected_collects_documents() {
        let session = Splitter::new().with_backend(backend()).unwrap();
        let run = session.extract_selected(&SectionSelection::titles(["1.1 scope", "2 REGISTERS"]));
        assert!(run.is_complete());
        assert_eq!(run.documents.len(), 2);
        assert_eq!(run.documents[0].spec.index, 1);
        assert_eq!(run.documents[1].tables().count(), 1);
    }

    #[test]
    fn test_missing_outline_fails_by_default() {
        let backend = MemoryBackend::new().with_page(page().text(72.0, 100.0, 10.0, "Text"));
        assert!(matches!(
            Splitter::new().with_backend(backend),
            Err(Error::MalformedOutline(_))
        ));
    }

    #[test]
    fn test_whole_document_fallback() {
        let backend = MemoryBackend::new()
            .with_page(page().text(72.0, 100.0, 10.0, "First page"))
            .with_page(page().text(72.0, 700.0, 10.0, "Last line"))
            .with_title("Reference Manual");
        let session = Splitter::with_options(SplitOptions::new().whole_document_fallback())
            .with_backend(backend)
            .unwrap();

        assert!(session.is_whole_document());
        assert_eq!(session.sections().len(), 1);
        let run = session.render_selected(&SectionSelection::All);
        assert_eq!(
            run.sections[0].markdown,
            "# Reference Manual\n\nFirst page\n\nLast line\n"
        );
        assert_eq!(run.sections[0].file_name, "001_Reference_Manual.md");
    }

    #[test]
    fn test_whole_document_title_defaults() {
        let backend = MemoryBackend::new().with_page(page());
        let session = Splitter::with_options(SplitOptions::new().whole_document_fallback())
            .with_backend(backend)
            .unwrap();
        assert_eq!(session.sections()[0].title, "Document");
    }
}
