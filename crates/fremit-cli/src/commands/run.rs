//! CLI handler for the `fremit run` subcommand.
//!
//! Reads newline-delimited JSON, pushes each value through a pipeline built
//! from command-line flags and prints every result as one JSON line.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use fremit_stream::{Engine, EngineConfig, FieldPath, Stream, install_default, with_default};
use serde_json::Value;
use tracing::{debug, info};

/// Pipeline described by `run` flags.
#[derive(Debug, Clone, Default)]
pub(crate) struct PipelineSpec {
    filters: Vec<(FieldPath, Value)>,
    unwinds: Vec<FieldPath>,
    select: Option<FieldPath>,
}

impl PipelineSpec {
    /// Parse `--filter PATH=JSON`, `--unwind PATH` and `--select PATH` flags.
    pub(crate) fn from_args(
        filters: &[String],
        unwinds: &[String],
        select: Option<&str>,
    ) -> Result<Self> {
        let filters = filters
            .iter()
            .map(|arg| parse_filter(arg))
            .collect::<Result<Vec<_>>>()?;
        let unwinds = unwinds
            .iter()
            .map(|raw| FieldPath::parse(raw).with_context(|| format!("invalid --unwind '{raw}'")))
            .collect::<Result<Vec<_>>>()?;
        let select = select
            .map(|raw| FieldPath::parse(raw).with_context(|| format!("invalid --select '{raw}'")))
            .transpose()?;

        Ok(Self {
            filters,
            unwinds,
            select,
        })
    }

    /// Attach this pipeline to `root`, pushing results into `out`.
    fn attach(&self, root: &Stream, out: &Rc<RefCell<VecDeque<Value>>>) {
        let mut stream = root.clone();

        for (path, expected) in &self.filters {
            let path = path.clone();
            let expected = expected.clone();
            stream = stream.filter(move |value| path.get(value) == Some(&expected));
        }
        for path in &self.unwinds {
            stream = stream.unwind_path(path.clone());
        }
        if let Some(path) = &self.select {
            let path = path.clone();
            stream = stream.map(move |value| path.get(&value).cloned().unwrap_or(Value::Null));
        }

        let out = Rc::clone(out);
        stream.for_each(move |value| out.borrow_mut().push_back(value.clone()));
    }
}

/// `PATH=JSON`; a value that is not valid JSON is taken as a string.
fn parse_filter(arg: &str) -> Result<(FieldPath, Value)> {
    let Some((raw_path, raw_value)) = arg.split_once('=') else {
        bail!("invalid --filter '{arg}': expected PATH=VALUE");
    };
    let path =
        FieldPath::parse(raw_path).with_context(|| format!("invalid --filter path '{raw_path}'"))?;
    let value = serde_json::from_str(raw_value)
        .unwrap_or_else(|_| Value::String(raw_value.to_owned()));
    Ok((path, value))
}

/// Counters reported when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    /// Non-blank input lines emitted.
    pub(crate) emitted: usize,
    /// JSON lines written.
    pub(crate) written: usize,
}

/// Feed `input` through `spec` on `engine`, writing results to `output`.
pub(crate) fn run_pipeline(
    spec: &PipelineSpec,
    input: impl BufRead,
    output: &mut impl Write,
    engine: &Engine,
) -> Result<RunSummary> {
    let results = Rc::new(RefCell::new(VecDeque::new()));
    spec.attach(&engine.root(), &results);

    let mut summary = RunSummary::default();
    for (index, line) in input.lines().enumerate() {
        let line_no = index.saturating_add(1);
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no}: invalid JSON"))?;
        engine.emit(value);
        summary.emitted = summary.emitted.saturating_add(1);

        summary.written = summary
            .written
            .saturating_add(flush_results(&results, output)?);
    }

    while engine.pending_tasks() > 0 {
        engine.run_deferred();
        summary.written = summary
            .written
            .saturating_add(flush_results(&results, output)?);
    }

    output.flush()?;
    Ok(summary)
}

fn flush_results(
    results: &Rc<RefCell<VecDeque<Value>>>,
    output: &mut impl Write,
) -> Result<usize> {
    let mut written = 0usize;
    loop {
        // Release the borrow before writing.
        let next = results.borrow_mut().pop_front();
        let Some(value) = next else {
            break;
        };
        serde_json::to_writer(&mut *output, &value)?;
        output.write_all(b"\n")?;
        written = written.saturating_add(1);
    }
    Ok(written)
}

/// Run the pipeline on the default engine, reading `input` or stdin.
pub(crate) fn run(input: Option<&Path>, spec: &PipelineSpec, config: EngineConfig) -> Result<()> {
    install_default(Engine::with_config(config));
    debug!(?spec, "Pipeline configured");

    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    let summary = with_default(|engine| match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run_pipeline(spec, BufReader::new(file), &mut output, engine)
        },
        None => run_pipeline(spec, io::stdin().lock(), &mut output, engine),
    })?;

    info!(
        emitted = summary.emitted,
        written = summary.written,
        "Run complete"
    );
    Ok(())
}
