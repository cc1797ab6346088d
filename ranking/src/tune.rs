//! Grid search over a model's parameters, scored by mean average precision
//! (and optionally NDCG) over a fixed set of judged queries.

use crate::eval::{average_precision, ndcg, MetricAccumulator, Qrels};
use crate::index::CorpusIndex;
use crate::query::Query;
use crate::scoring::{ModelKind, ScoringFunction};
use crate::search::search;
use crate::{RankError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), values }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterGrid {
    /// Every combination of the axes; the first axis varies slowest.
    Cartesian(Vec<GridAxis>),
    /// Hand-picked cells over the named parameters.
    Rows { names: Vec<String>, rows: Vec<Vec<f64>> },
}

impl ParameterGrid {
    pub fn rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let grid = ParameterGrid::Rows { names, rows };
        grid.check_shape()?;
        Ok(grid)
    }

    /// One cell per non-blank line, values separated by whitespace.
    pub fn read_rows<R: BufRead>(names: Vec<String>, reader: R) -> Result<Self> {
        let mut rows = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|field| {
                    field
                        .parse::<f64>()
                        .map_err(|_| RankError::InvalidGrid(format!("line {}: bad value {field:?}", idx + 1)))
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }
        Self::rows(names, rows)
    }

    /// The sweep each model is tuned over when no grid is given.
    pub fn default_for(kind: ModelKind) -> Self {
        let axes = match kind {
            ModelKind::Bm25 => vec![
                GridAxis::new(
                    "k1",
                    vec![0.01, 0.5, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 2.1, 2.2, 2.3],
                ),
                GridAxis::new("b", vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
                GridAxis::new("k3", vec![500.0]),
            ],
            ModelKind::Pl2 => vec![
                GridAxis::new("c", vec![0.3, 0.6, 0.9, 0.2, 0.1, 0.01, 2.1, 2.4]),
                GridAxis::new("lambda", vec![1e-6, 1e-5, 1e-4, 1e-3, 0.01, 0.1, 1.0, 10.0]),
            ],
            ModelKind::Mdtf2ln => vec![
                GridAxis::new("alpha", vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]),
                GridAxis::new("lambda", vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8]),
                GridAxis::new("s", vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]),
                GridAxis::new("mu", vec![10.0, 50.0, 100.0]),
            ],
            ModelKind::Mptf2ln => vec![
                GridAxis::new("alpha", vec![0.8, 1.0]),
                GridAxis::new("lambda", vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8]),
                GridAxis::new("s", vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]),
                GridAxis::new("mu", vec![10.0, 50.0, 100.0]),
            ],
            ModelKind::Sigmoidal => vec![
                GridAxis::new("b1", vec![1.0, 1.5, 2.0, 2.5]),
                GridAxis::new("b2", vec![1.0, 1.5, 2.0, 2.5]),
                GridAxis::new("l1", vec![0.25, 0.5, 1.0, 1.5, 1.75]),
                GridAxis::new("l2", vec![0.25, 0.5, 1.0, 1.5, 1.75]),
                GridAxis::new("c", vec![0.25, 0.5, 1.0, 1.5, 1.75]),
                GridAxis::new("k", vec![0.01, 1.0, 2.0]),
            ],
            ModelKind::Mountain => vec![GridAxis::new(
                "lambda",
                vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9],
            )],
            ModelKind::PivotedLength => {
                vec![GridAxis::new("s", vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])]
            }
            ModelKind::JelinekMercer => {
                vec![GridAxis::new("lambda", vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])]
            }
            ModelKind::DirichletPrior => vec![GridAxis::new("mu", vec![0.0, 500.0, 2000.0])],
        };
        ParameterGrid::Cartesian(axes)
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            ParameterGrid::Cartesian(axes) => axes.iter().map(|axis| axis.name.as_str()).collect(),
            ParameterGrid::Rows { names, .. } => names.iter().map(String::as_str).collect(),
        }
    }

    /// Cells in evaluation order, values in the order of [`names`](Self::names).
    pub fn cells(&self) -> Vec<Vec<f64>> {
        match self {
            ParameterGrid::Cartesian(axes) => axes.iter().fold(vec![Vec::new()], |cells, axis| {
                cells
                    .iter()
                    .flat_map(|prefix| {
                        axis.values.iter().map(move |&value| {
                            let mut cell = prefix.clone();
                            cell.push(value);
                            cell
                        })
                    })
                    .collect()
            }),
            ParameterGrid::Rows { rows, .. } => rows.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParameterGrid::Cartesian(axes) => axes.iter().map(|axis| axis.values.len()).product(),
            ParameterGrid::Rows { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_shape(&self) -> Result<()> {
        let names = self.names();
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|name| !seen.insert(**name)) {
            return Err(RankError::InvalidGrid(format!("parameter {dup:?} named twice")));
        }
        if let ParameterGrid::Rows { rows, .. } = self {
            if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != names.len()) {
                return Err(RankError::InvalidGrid(format!(
                    "row {} has {} values, expected {}",
                    idx + 1,
                    row.len(),
                    names.len()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Map,
    Ndcg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningOptions {
    /// Rank cutoff for both metrics.
    pub cutoff: usize,
    pub with_ndcg: bool,
    pub objective: Objective,
}

impl Default for TuningOptions {
    fn default() -> Self {
        Self { cutoff: 5, with_ndcg: false, objective: Objective::Map }
    }
}

impl TuningOptions {
    fn computes_ndcg(&self) -> bool {
        self.with_ndcg || self.objective == Objective::Ndcg
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningResult {
    /// Grid values in grid order.
    pub values: Vec<f64>,
    /// The full parameter set the cell was scored with, in model order.
    pub params: Vec<f64>,
    pub map: f64,
    pub ndcg: Option<f64>,
}

impl TuningResult {
    pub fn metric(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Map => self.map,
            Objective::Ndcg => self.ndcg.unwrap_or(0.0),
        }
    }

    pub fn to_tsv(&self) -> String {
        let mut fields: Vec<String> = self.values.iter().map(f64::to_string).collect();
        fields.push(self.map.to_string());
        if let Some(ndcg) = self.ndcg {
            fields.push(ndcg.to_string());
        }
        fields.join("\t")
    }
}

/// Destination of the per-cell result rows.
pub trait ResultSink {
    fn append(&mut self, row: &TuningResult) -> Result<()>;
}

impl ResultSink for Vec<TuningResult> {
    fn append(&mut self, row: &TuningResult) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

/// Append-only tab-separated log, one line per cell.
#[derive(Debug)]
pub struct TsvLog {
    path: PathBuf,
    file: File,
}

impl TsvLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// `<dir>/<id>_results.txt`
    pub fn for_model(dir: &Path, kind: ModelKind) -> Result<Self> {
        Self::open(dir.join(format!("{}_results.txt", kind.id())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for TsvLog {
    fn append(&mut self, row: &TuningResult) -> Result<()> {
        writeln!(self.file, "{}", row.to_tsv())?;
        self.file.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningSummary {
    pub model: ModelKind,
    pub names: Vec<String>,
    pub objective: Objective,
    pub best: Option<TuningResult>,
    pub evaluated: usize,
    pub skipped: usize,
}

impl TuningSummary {
    /// Scorer configured with the winning parameters.
    pub fn best_scorer(&self) -> Option<Result<Box<dyn ScoringFunction>>> {
        self.best.as_ref().map(|row| self.model.with_params(&row.params))
    }

    fn observe(&mut self, row: TuningResult) {
        let better = match &self.best {
            None => true,
            Some(best) => row.metric(self.objective) > best.metric(self.objective),
        };
        if better {
            self.best = Some(row);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tuner {
    kind: ModelKind,
    grid: ParameterGrid,
    options: TuningOptions,
    /// Model parameter position of each grid column.
    positions: Vec<usize>,
}

impl Tuner {
    pub fn new(kind: ModelKind, grid: ParameterGrid, options: TuningOptions) -> Result<Self> {
        if options.cutoff == 0 {
            return Err(RankError::ZeroK);
        }
        grid.check_shape()?;
        let positions = grid.names().iter().map(|name| kind.param_index(name)).collect::<Result<Vec<_>>>()?;
        Ok(Self { kind, grid, options, positions })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    /// Model defaults with the cell's values written over the named slots.
    pub fn params_for(&self, cell: &[f64]) -> Vec<f64> {
        let mut params = self.kind.default_params();
        for (&pos, &value) in self.positions.iter().zip(cell) {
            params[pos] = value;
        }
        params
    }

    /// Scores every query under one cell, recording into `acc`, which is
    /// handed back filled. A query without judgments has nothing relevant to
    /// find and records 0.0 for each metric.
    pub fn evaluate_cell(
        &self,
        cell: &[f64],
        index: &CorpusIndex,
        queries: &[Query],
        qrels: &Qrels,
        mut acc: MetricAccumulator,
    ) -> Result<MetricAccumulator> {
        let scorer = self.kind.with_params(&self.params_for(cell))?;
        for query in queries {
            let Ok(judgments) = qrels.judgments(query.id) else {
                tracing::debug!(query = query.id, "no judgments, scoring as zero");
                acc.record_average_precision(0.0);
                if self.options.computes_ndcg() {
                    acc.record_ndcg(0.0);
                }
                continue;
            };
            let ranking = search(index, query, scorer.as_ref());
            acc.record_average_precision(average_precision(&ranking, judgments, self.options.cutoff));
            if self.options.computes_ndcg() {
                acc.record_ndcg(ndcg(&ranking, judgments, self.options.cutoff));
            }
        }
        Ok(acc)
    }

    pub fn run(
        &self,
        index: &CorpusIndex,
        queries: &[Query],
        qrels: &Qrels,
        sink: &mut dyn ResultSink,
    ) -> Result<TuningSummary> {
        let mut summary = self.empty_summary();
        let mut acc = MetricAccumulator::default();
        for cell in self.grid.cells() {
            acc.reset();
            acc = match self.evaluate_cell(&cell, index, queries, qrels, acc) {
                Ok(filled) => {
                    self.record(&mut summary, sink, cell, &filled)?;
                    filled
                }
                Err(err) => {
                    self.skip(&mut summary, &cell, &err);
                    MetricAccumulator::default()
                }
            };
        }
        self.finish(&summary);
        Ok(summary)
    }

    /// Like [`run`](Self::run) with cells evaluated on the rayon pool. Rows
    /// reach the sink in cell order.
    pub fn run_parallel(
        &self,
        index: &CorpusIndex,
        queries: &[Query],
        qrels: &Qrels,
        sink: &mut dyn ResultSink,
    ) -> Result<TuningSummary> {
        let outcomes: Vec<(Vec<f64>, Result<MetricAccumulator>)> = self
            .grid
            .cells()
            .into_par_iter()
            .map(|cell| {
                let outcome = self.evaluate_cell(&cell, index, queries, qrels, MetricAccumulator::default());
                (cell, outcome)
            })
            .collect();

        let mut summary = self.empty_summary();
        for (cell, outcome) in outcomes {
            match outcome {
                Ok(filled) => self.record(&mut summary, sink, cell, &filled)?,
                Err(err) => self.skip(&mut summary, &cell, &err),
            }
        }
        self.finish(&summary);
        Ok(summary)
    }

    fn empty_summary(&self) -> TuningSummary {
        TuningSummary {
            model: self.kind,
            names: self.grid.names().into_iter().map(str::to_string).collect(),
            objective: self.options.objective,
            best: None,
            evaluated: 0,
            skipped: 0,
        }
    }

    fn record(
        &self,
        summary: &mut TuningSummary,
        sink: &mut dyn ResultSink,
        cell: Vec<f64>,
        acc: &MetricAccumulator,
    ) -> Result<()> {
        let row = TuningResult {
            params: self.params_for(&cell),
            values: cell,
            map: acc.map(),
            ndcg: self.options.computes_ndcg().then(|| acc.mean_ndcg()),
        };
        tracing::debug!(model = self.kind.id(), values = ?row.values, map = row.map, ndcg = ?row.ndcg, "evaluated cell");
        sink.append(&row)?;
        summary.evaluated += 1;
        summary.observe(row);
        Ok(())
    }

    fn skip(&self, summary: &mut TuningSummary, cell: &[f64], err: &RankError) {
        tracing::warn!(model = self.kind.id(), values = ?cell, error = %err, "skipping cell");
        summary.skipped += 1;
    }

    fn finish(&self, summary: &TuningSummary) {
        let best = summary.best.as_ref().map(|row| row.metric(summary.objective));
        tracing::info!(
            model = self.kind.id(),
            evaluated = summary.evaluated,
            skipped = summary.skipped,
            best = ?best,
            "tuning finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentRecord;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    /// Term 0 is the query term. "hit" documents are judged relevant; the
    /// long ones only win under weak length normalization.
    fn fixture() -> (CorpusIndex, Vec<Query>, Qrels) {
        let docs = vec![
            DocumentRecord::new("hit-short", "a", HashMap::from([(0, 2), (1, 3)])),
            DocumentRecord::new("miss-long", "b", HashMap::from([(0, 4), (1, 60)])),
            DocumentRecord::new("hit-mid", "a", HashMap::from([(0, 1), (2, 8)])),
            DocumentRecord::new("miss-mid", "b", HashMap::from([(1, 5), (2, 5)])),
        ];
        let index = CorpusIndex::build(docs).unwrap();
        let queries = vec![Query::new(0, HashMap::from([(0, 1)]), 1), Query::new(1, HashMap::from([(0, 1), (2, 1)]), 2)];
        let mut qrels = Qrels::new();
        qrels.insert(0, "hit-short", 1);
        qrels.insert(0, "hit-mid", 1);
        qrels.insert(1, "hit-mid", 2);
        (index, queries, qrels)
    }

    fn bm25_grid() -> ParameterGrid {
        ParameterGrid::Cartesian(vec![GridAxis::new("k1", vec![0.5, 1.2, 2.0]), GridAxis::new("b", vec![0.0, 0.75, 1.0])])
    }

    #[test]
    fn cartesian_cells_vary_last_axis_fastest() {
        let grid = ParameterGrid::Cartesian(vec![GridAxis::new("a", vec![1.0, 2.0]), GridAxis::new("b", vec![3.0, 4.0])]);
        assert_eq!(grid.cells(), vec![vec![1.0, 3.0], vec![1.0, 4.0], vec![2.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn default_grids_name_real_parameters() {
        for kind in ModelKind::ALL {
            let grid = ParameterGrid::default_for(kind);
            assert!(!grid.is_empty(), "{kind}");
            Tuner::new(kind, grid, TuningOptions::default()).unwrap();
        }
        assert_eq!(ParameterGrid::default_for(ModelKind::Bm25).len(), 16 * 11);
    }

    #[test]
    fn unknown_axis_is_rejected() {
        let grid = ParameterGrid::Cartesian(vec![GridAxis::new("mu", vec![1.0])]);
        assert!(matches!(
            Tuner::new(ModelKind::Bm25, grid, TuningOptions::default()),
            Err(RankError::UnknownParameter { model: "bm25", .. })
        ));
        let options = TuningOptions { cutoff: 0, ..TuningOptions::default() };
        assert!(matches!(Tuner::new(ModelKind::Bm25, bm25_grid(), options), Err(RankError::ZeroK)));
    }

    #[test]
    fn rows_are_read_and_shape_checked() {
        let input = Cursor::new("2 3 1 1 0.5 1\n\n1.5 2 0.25 0.5 1 2\n");
        let grid = ParameterGrid::read_rows(names(&["b1", "b2", "l1", "l2", "c", "k"]), input).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cells()[1], vec![1.5, 2.0, 0.25, 0.5, 1.0, 2.0]);

        assert!(matches!(ParameterGrid::rows(names(&["s", "mu"]), vec![vec![0.1]]), Err(RankError::InvalidGrid(_))));
        assert!(matches!(
            ParameterGrid::read_rows(names(&["s"]), Cursor::new("x\n")),
            Err(RankError::InvalidGrid(_))
        ));
        assert!(matches!(ParameterGrid::rows(names(&["s", "s"]), vec![]), Err(RankError::InvalidGrid(_))));
    }

    #[test]
    fn unnamed_parameters_keep_defaults() {
        let grid = ParameterGrid::Cartesian(vec![GridAxis::new("b", vec![0.3])]);
        let tuner = Tuner::new(ModelKind::Bm25, grid, TuningOptions::default()).unwrap();
        assert_eq!(tuner.params_for(&[0.3]), vec![1.5, 0.3, 500.0]);
    }

    #[test]
    fn one_row_per_cell_and_repeatable() {
        let (index, queries, qrels) = fixture();
        let tuner = Tuner::new(ModelKind::Bm25, bm25_grid(), TuningOptions::default()).unwrap();
        let mut first = Vec::new();
        let summary = tuner.run(&index, &queries, &qrels, &mut first).unwrap();
        assert_eq!(first.len(), 9);
        assert_eq!(summary.evaluated, 9);
        assert_eq!(summary.skipped, 0);
        assert_eq!(first[4].values, vec![1.2, 0.75]);
        assert!(first.iter().all(|row| row.ndcg.is_none() && (0.0..=1.0).contains(&row.map)));

        let mut second = Vec::new();
        let again = tuner.run(&index, &queries, &qrels, &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(summary, again);
    }

    #[test]
    fn best_is_earliest_strict_maximum() {
        let (index, queries, qrels) = fixture();
        let tuner = Tuner::new(ModelKind::Bm25, bm25_grid(), TuningOptions::default()).unwrap();
        let mut rows = Vec::new();
        let summary = tuner.run(&index, &queries, &qrels, &mut rows).unwrap();
        let top = rows.iter().map(|row| row.map).fold(f64::MIN, f64::max);
        let earliest = rows.iter().find(|row| row.map == top).unwrap();
        assert_eq!(summary.best.as_ref(), Some(earliest));
        let scorer = summary.best_scorer().unwrap().unwrap();
        assert_eq!(scorer.params(), earliest.params);
    }

    #[test]
    fn parallel_rows_match_sequential_rows() {
        let (index, queries, qrels) = fixture();
        let options = TuningOptions { with_ndcg: true, ..TuningOptions::default() };
        let tuner = Tuner::new(ModelKind::Mdtf2ln, ParameterGrid::default_for(ModelKind::Mdtf2ln), options).unwrap();
        let mut sequential = Vec::new();
        let mut parallel = Vec::new();
        let a = tuner.run(&index, &queries, &qrels, &mut sequential).unwrap();
        let b = tuner.run_parallel(&index, &queries, &qrels, &mut parallel).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(a, b);
        assert!(sequential.iter().all(|row| row.ndcg.is_some()));
    }

    #[test]
    fn cells_start_from_empty_accumulators() {
        let (index, queries, qrels) = fixture();
        let grid = ParameterGrid::Cartesian(vec![GridAxis::new("s", vec![0.2, 0.2, 0.2])]);
        let tuner = Tuner::new(ModelKind::PivotedLength, grid, TuningOptions::default()).unwrap();
        let mut rows = Vec::new();
        tuner.run(&index, &queries, &qrels, &mut rows).unwrap();
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[1], rows[2]);

        let filled = tuner.evaluate_cell(&[0.2], &index, &queries, &qrels, MetricAccumulator::default()).unwrap();
        assert_eq!(filled.queries(), queries.len());
        assert_eq!(filled.map(), rows[0].map);
    }

    #[test]
    fn unjudged_queries_score_zero_without_failing_cells() {
        let (index, mut queries, qrels) = fixture();
        let tuner = Tuner::new(ModelKind::Bm25, bm25_grid(), TuningOptions::default()).unwrap();
        let mut judged_only = Vec::new();
        tuner.run(&index, &queries, &qrels, &mut judged_only).unwrap();

        queries.push(Query::new(7, HashMap::from([(1, 1)]), 1));
        let mut rows = Vec::new();
        let summary = tuner.run(&index, &queries, &qrels, &mut rows).unwrap();
        assert_eq!(summary.evaluated, 9);
        assert_eq!(summary.skipped, 0);
        assert!(summary.best.is_some());
        for (with_unjudged, judged) in rows.iter().zip(&judged_only) {
            assert!((with_unjudged.map - judged.map * 2.0 / 3.0).abs() < 1e-12);
        }

        let filled = tuner.evaluate_cell(&[1.2, 0.75], &index, &queries, &qrels, MetricAccumulator::default()).unwrap();
        assert_eq!(filled.queries(), 3);
    }

    fn grid_with_invalid_middle_row() -> ParameterGrid {
        let input = Cursor::new("1.2 0.75 500\n1.2 nan 500\n2.0 0.0 500\n");
        ParameterGrid::read_rows(names(&["k1", "b", "k3"]), input).unwrap()
    }

    #[test]
    fn a_failing_cell_does_not_stop_the_sweep() {
        let (index, queries, qrels) = fixture();
        let tuner = Tuner::new(ModelKind::Bm25, grid_with_invalid_middle_row(), TuningOptions::default()).unwrap();
        let mut rows = Vec::new();
        let summary = tuner.run(&index, &queries, &qrels, &mut rows).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values, vec![1.2, 0.75, 500.0]);
        assert_eq!(rows[1].values, vec![2.0, 0.0, 500.0]);
        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.skipped, 1);

        let best = summary.best.as_ref().unwrap();
        assert!(rows.contains(best));
        assert!(rows.iter().all(|row| row.map <= best.map));
    }

    #[test]
    fn a_failing_cell_does_not_stop_the_parallel_sweep() {
        let (index, queries, qrels) = fixture();
        let tuner = Tuner::new(ModelKind::Bm25, grid_with_invalid_middle_row(), TuningOptions::default()).unwrap();
        let mut sequential = Vec::new();
        let mut parallel = Vec::new();
        let a = tuner.run(&index, &queries, &qrels, &mut sequential).unwrap();
        let b = tuner.run_parallel(&index, &queries, &qrels, &mut parallel).unwrap();
        assert_eq!(parallel.len(), 2);
        assert_eq!(b.skipped, 1);
        assert_eq!(sequential, parallel);
        assert_eq!(a, b);
    }

    #[test]
    fn ndcg_objective_picks_by_ndcg() {
        let (index, queries, qrels) = fixture();
        let options = TuningOptions { objective: Objective::Ndcg, ..TuningOptions::default() };
        let tuner = Tuner::new(ModelKind::Bm25, bm25_grid(), options).unwrap();
        let mut rows = Vec::new();
        let summary = tuner.run(&index, &queries, &qrels, &mut rows).unwrap();
        let top = rows.iter().filter_map(|row| row.ndcg).fold(f64::MIN, f64::max);
        assert_eq!(summary.best.unwrap().ndcg, Some(top));
    }

    #[test]
    fn tsv_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let row = TuningResult { values: vec![1.2, 0.75], params: vec![1.2, 0.75, 500.0], map: 0.5, ndcg: Some(0.25) };
        {
            let mut log = TsvLog::for_model(dir.path(), ModelKind::Bm25).unwrap();
            assert!(log.path().ends_with("bm25_results.txt"));
            log.append(&row).unwrap();
        }
        let mut log = TsvLog::for_model(dir.path(), ModelKind::Bm25).unwrap();
        log.append(&TuningResult { ndcg: None, ..row }).unwrap();
        let text = std::fs::read_to_string(dir.path().join("bm25_results.txt")).unwrap();
        assert_eq!(text, "1.2\t0.75\t0.5\t0.25\n1.2\t0.75\t0.5\n");
    }
}
