//! # Block Scanner
//!
//! Walks the lines of one file, opens a container per block, splits rows
//! into cells and hands each cell to the resolver bound to its column.
//!
//! ## Blocks
//!
//! A leaf block reads rows until its end delimiter (consumed), an
//! ancestor's end delimiter (left for the ancestor) or end of input. A block
//! with nested blocks starts a child for each line that matches a child's
//! begin delimiter, or any line for the child without one.
//!
//! ## Staging
//!
//! Everything a block writes goes into its own [`ImportOutput`] and is
//! absorbed by the parent only when the block commits. A block that fails
//! under [`ErrorPolicy::SkipBlock`] is dropped whole and the corpus indices
//! it took are handed out again.

mod cells;
mod context;
mod counters;
mod error;
mod matcher;
mod prepared;

pub use cells::Separator;
pub use counters::IndexCounters;
pub use error::ScanError;
pub use matcher::Matcher;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::converter::Converter;
use crate::model::{Container, ImportOutput, Item, ItemId, Member, WriteSink};
use crate::resolver::{CacheProvider, ReadMode, ResolverRegistry};
use crate::text::{LineRef, Span};

use context::ScanContext;
use prepared::{Binder, PreparedAttribute, PreparedBlock};

/// What to do with a block whose content cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first content error.
    #[default]
    Abort,
    /// Drop the block, log a warning and continue after its end delimiter.
    SkipBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBlock {
    pub layer: String,
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Committed containers, nested ones included.
    pub containers: usize,
    pub skipped: Vec<SkippedBlock>,
}

pub struct Scanner {
    root: PreparedBlock,
    policy: ErrorPolicy,
    cells: Vec<Span>,
}

/// End delimiters of the enclosing blocks, innermost first.
#[derive(Clone, Copy)]
struct Boundaries<'b> {
    end: Option<&'b Matcher>,
    parent: Option<&'b Boundaries<'b>>,
}

impl Boundaries<'_> {
    fn matches(&self, text: &str) -> bool {
        self.end.is_some_and(|m| m.matches(text)) || self.parent.is_some_and(|p| p.matches(text))
    }
}

fn closes(outer: Option<&Boundaries<'_>>, text: &str) -> bool {
    outer.is_some_and(|b| b.matches(text))
}

struct Env<'s> {
    lines: &'s [LineRef],
    pos: usize,
    cells: &'s mut Vec<Span>,
    counters: &'s mut IndexCounters,
    policy: ErrorPolicy,
    report: &'s mut ScanReport,
}

impl Env<'_> {
    fn line_number(&self) -> usize {
        self.lines
            .get(self.pos)
            .or(self.lines.last())
            .map_or(0, |l| l.number)
    }

    /// The line most recently consumed.
    fn last_line_number(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.lines.get(p))
            .map_or(0, |l| l.number)
    }
}

impl Scanner {
    /// Creates and binds every resolver the schema refers to.
    ///
    /// All configuration errors surface here, before any line is read.
    pub fn new(
        converter: &Converter,
        registry: &ResolverRegistry,
        mode: ReadMode,
        cache: &dyn CacheProvider,
        policy: ErrorPolicy,
    ) -> Result<Self, ScanError> {
        let binder = Binder {
            converter,
            registry,
            mode,
            cache,
        };
        let root = binder.block(&converter.schema().root)?;
        Ok(Self {
            root,
            policy,
            cells: Vec::new(),
        })
    }

    /// Scans one file. Committed members and annotations are absorbed into
    /// `output`; `counters` continue from the previous file.
    pub fn scan(
        &mut self,
        lines: &[LineRef],
        counters: &mut IndexCounters,
        output: &mut ImportOutput,
    ) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::default();
        let mut env = Env {
            lines,
            pos: 0,
            cells: &mut self.cells,
            counters,
            policy: self.policy,
            report: &mut report,
        };
        let root = &mut self.root;

        while let Some(line) = lines.get(env.pos) {
            let text = line.content();
            let starts = root
                .begin
                .as_ref()
                .is_none_or(|begin| begin.matcher.matches(text));

            if starts {
                scan_block(root, &mut env, output, None)?;
            } else if text.trim().is_empty() {
                env.pos += 1;
            } else {
                env.pos += 1;
                let err = ScanError::UnexpectedLine {
                    line: line.number,
                    block: root.layer_id.clone(),
                    text: text.to_string(),
                };
                if env.policy == ErrorPolicy::Abort {
                    return Err(err);
                }
                warn!("Skipping line outside of any block: {err}");
                env.report.skipped.push(SkippedBlock {
                    layer: root.layer_id.clone(),
                    line: Some(line.number),
                    message: err.to_string(),
                });
            }
        }

        Ok(report)
    }

    /// Closes every resolver. Dropping the scanner does the same.
    pub fn close(&mut self) {
        self.root.close();
    }
}

/// Scans one block starting at `env.pos`. Returns the committed container,
/// or `None` for an empty or skipped block.
fn scan_block(
    block: &mut PreparedBlock,
    env: &mut Env<'_>,
    out: &mut ImportOutput,
    outer: Option<&Boundaries<'_>>,
) -> Result<Option<ItemId>, ScanError> {
    let checkpoint = env.counters.clone();
    let id = env.counters.allocate(block.layer);
    let mut container = Container::new(id, block.container_type);
    let mut staged = ImportOutput::default();

    if let Err(err) = fill_block(block, env, &mut container, &mut staged, outer) {
        return abort(block, env, checkpoint, err, outer, true);
    }
    if container.is_empty() {
        *env.counters = checkpoint;
        return Ok(None);
    }
    if let Err(err) = end_batches(block, env, &container, &mut staged) {
        return abort(block, env, checkpoint, err, outer, false);
    }

    debug!(
        "Committed container {} in layer '{}' with {} members",
        id.index,
        block.layer_id,
        container.len()
    );
    staged
        .sink(block.layer)
        .offer(Member::Container(container), id.index);
    out.absorb(staged);
    env.report.containers += 1;
    Ok(Some(id))
}

fn abort(
    block: &PreparedBlock,
    env: &mut Env<'_>,
    checkpoint: IndexCounters,
    err: ScanError,
    outer: Option<&Boundaries<'_>>,
    resync: bool,
) -> Result<Option<ItemId>, ScanError> {
    *env.counters = checkpoint;
    if env.policy == ErrorPolicy::Abort || !err.is_content() {
        return Err(err);
    }
    if resync {
        skip_block(block.end.as_ref(), env, outer);
    }
    warn!("Skipping block in layer '{}': {err}", block.layer_id);
    env.report.skipped.push(SkippedBlock {
        layer: block.layer_id.clone(),
        line: err.line(),
        message: err.to_string(),
    });
    Ok(None)
}

/// Advances past the rest of a failed block.
fn skip_block(end: Option<&Matcher>, env: &mut Env<'_>, outer: Option<&Boundaries<'_>>) {
    while let Some(line) = env.lines.get(env.pos) {
        let text = line.content();
        if end.is_some_and(|m| m.matches(text)) {
            env.pos += 1;
            return;
        }
        if closes(outer, text) {
            return;
        }
        env.pos += 1;
    }
}

fn fill_block(
    block: &mut PreparedBlock,
    env: &mut Env<'_>,
    container: &mut Container,
    staged: &mut ImportOutput,
    outer: Option<&Boundaries<'_>>,
) -> Result<(), ScanError> {
    let lines = env.lines;
    let started = block.resolvers_mut().try_for_each(|resolver| {
        let mut ctx = ScanContext {
            raw: "",
            item: None,
            container: &*container,
            index: 0,
            output: &mut *staged,
        };
        resolver.begin_batch(&mut ctx)
    });
    started.map_err(|source| ScanError::Resolver {
        line: env.line_number(),
        location: format!("start of block '{}'", block.layer_id),
        source,
    })?;

    if let Some(begin) = block.begin.as_mut()
        && let Some(line) = lines.get(env.pos)
    {
        env.pos += 1;
        apply_attribute(begin, line, container, staged)?;
    }

    if block.is_leaf() {
        read_rows(block, env, container, staged, outer)
    } else {
        read_nested(block, env, container, staged, outer)
    }
}

fn read_rows(
    block: &mut PreparedBlock,
    env: &mut Env<'_>,
    container: &mut Container,
    staged: &mut ImportOutput,
    outer: Option<&Boundaries<'_>>,
) -> Result<(), ScanError> {
    let lines = env.lines;
    while let Some(line) = lines.get(env.pos) {
        let text = line.content();
        if block.end.as_ref().is_some_and(|m| m.matches(text)) {
            env.pos += 1;
            return Ok(());
        }
        if closes(outer, text) {
            return Ok(());
        }
        env.pos += 1;

        if let Some(attribute) = block
            .attributes
            .iter_mut()
            .find(|a| a.matcher.matches(text))
        {
            apply_attribute(attribute, line, container, staged)?;
            continue;
        }
        process_row(block, env, line, container, staged)?;
    }
    Ok(())
}

fn read_nested(
    block: &mut PreparedBlock,
    env: &mut Env<'_>,
    container: &mut Container,
    staged: &mut ImportOutput,
    outer: Option<&Boundaries<'_>>,
) -> Result<(), ScanError> {
    let lines = env.lines;
    let bounds = Boundaries {
        end: block.end.as_ref(),
        parent: outer,
    };

    while let Some(line) = lines.get(env.pos) {
        let text = line.content();
        if bounds.end.is_some_and(|m| m.matches(text)) {
            env.pos += 1;
            return Ok(());
        }
        if closes(outer, text) {
            return Ok(());
        }

        if let Some(attribute) = block
            .attributes
            .iter_mut()
            .find(|a| a.matcher.matches(text))
        {
            env.pos += 1;
            apply_attribute(attribute, line, container, staged)?;
            continue;
        }

        let child = block
            .blocks
            .iter()
            .position(|b| b.begin.as_ref().is_some_and(|a| a.matcher.matches(text)))
            .or_else(|| block.blocks.iter().position(|b| b.begin.is_none()));
        match child {
            Some(idx) => {
                if let Some(id) = scan_block(&mut block.blocks[idx], env, staged, Some(&bounds))? {
                    container.items.push(id);
                }
            }
            None if text.trim().is_empty() => env.pos += 1,
            None => {
                return Err(ScanError::UnexpectedLine {
                    line: line.number,
                    block: block.layer_id.clone(),
                    text: text.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn apply_attribute(
    attribute: &mut PreparedAttribute,
    line: &LineRef,
    container: &Container,
    staged: &mut ImportOutput,
) -> Result<(), ScanError> {
    let text = line.content();
    let Some(resolver) = attribute.resolver.as_mut() else {
        return Ok(());
    };
    let Some(payload) = attribute.matcher.payload(text) else {
        return Ok(());
    };
    let mut ctx = ScanContext {
        raw: payload.slice(text),
        item: Some(container.id),
        container,
        index: container.len(),
        output: staged,
    };
    resolver
        .process(&mut ctx)
        .map(|_| ())
        .map_err(|source| ScanError::Resolver {
            line: line.number,
            location: format!("attribute '{}'", attribute.matcher.pattern()),
            source,
        })
}

fn process_row(
    block: &mut PreparedBlock,
    env: &mut Env<'_>,
    line: &LineRef,
    container: &mut Container,
    staged: &mut ImportOutput,
) -> Result<(), ScanError> {
    let text = line.content();
    let Some(component) = block.component_layer else {
        return Err(ScanError::UnexpectedLine {
            line: line.number,
            block: block.layer_id.clone(),
            text: text.to_string(),
        });
    };

    block.separator.split_into(text, env.cells);
    let declared = block.columns.len();
    let found = env.cells.len();
    if found < declared || (found > declared && block.fallback.is_none()) {
        return Err(ScanError::CellCount {
            line: line.number,
            expected: declared,
            found,
        });
    }

    let id = env.counters.allocate(component);
    container.items.push(id);
    let row = container.len() - 1;
    staged.sink(component).offer(
        Member::Item(Item {
            id,
            span: line.span,
        }),
        id.index,
    );

    for (position, cell) in env.cells.iter().enumerate() {
        let column = match block.columns.get_mut(position) {
            Some(column) => column,
            None => match block.fallback.as_mut() {
                Some(fallback) => fallback,
                None => break,
            },
        };
        if column.ignore {
            continue;
        }
        let raw = cell.slice(text);
        if block.no_entry_label.as_deref() == Some(raw) {
            continue;
        }
        let Some(resolver) = column.resolver.as_mut() else {
            continue;
        };

        let item = if column.targets_container {
            container.id
        } else {
            id
        };
        let mut ctx = ScanContext {
            raw,
            item: Some(item),
            container,
            index: row,
            output: staged,
        };
        resolver
            .process(&mut ctx)
            .map_err(|source| ScanError::Resolver {
                line: line.number,
                location: format!("column '{}'", column.name),
                source,
            })?;
    }
    Ok(())
}

fn end_batches(
    block: &mut PreparedBlock,
    env: &Env<'_>,
    container: &Container,
    staged: &mut ImportOutput,
) -> Result<(), ScanError> {
    let finished = block.resolvers_mut().try_for_each(|resolver| {
        let mut ctx = ScanContext {
            raw: "",
            item: None,
            container,
            index: container.len().saturating_sub(1),
            output: &mut *staged,
        };
        resolver.end_batch(&mut ctx)
    });
    finished.map_err(|source| ScanError::Resolver {
        line: env.last_line_number(),
        location: format!("end of block '{}'", block.layer_id),
        source,
    })
}
