//! Per-evaluator session state: who is rating, where they are in the
//! sample walk, and what they scored so far.
//!
//! Walk order mirrors the manifest: the single variant goes model-major
//! (every sample of model 1, then model 2, ...); the comparison variant
//! goes pair-major over all unordered model pairs, skipping pairs with
//! no jointly-valid rows.

use crate::manifest::Manifest;
use crate::pairing::{all_pairs, ModelPair, PresentationOrder};
use crate::scoring::Score;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;

/// Monotonic index over an ordered list, clamped to `[0, len]`.
/// `index == len` means the list is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.len
    }

    pub fn advance(&mut self) {
        if self.index < self.len {
            self.index += 1;
        }
    }

    pub fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Adjust to a list whose length changed underneath us (the sample
    /// lists are recomputed from the manifest on every lookup).
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.index > len {
            self.index = len;
        }
    }
}

/// Accumulated scores for one session, keyed by `model/audio_file`.
/// An absent key is the "unscored" sentinel.
#[derive(Debug, Clone, Default)]
pub struct ScoreSheet {
    scores: BTreeMap<String, Score>,
}

pub fn score_key(model: &str, audio_file: &str) -> String {
    format!("{}/{}", model, audio_file)
}

impl ScoreSheet {
    pub fn get(&self, key: &str) -> Option<Score> {
        self.scores.get(key).copied()
    }

    pub fn set(&mut self, key: String, score: Score) {
        self.scores.insert(key, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Single-sample variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SingleSession {
    pub user_name: String,
    model_index: usize,
    samples: Cursor,
    sheet: ScoreSheet,
}

/// Everything the evaluation page needs to render the current sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglePosition {
    pub model: String,
    pub model_index: usize,
    pub model_total: usize,
    pub sample_index: usize,
    pub sample_total: usize,
    pub transcription: String,
    pub audio_file: String,
    /// A previously submitted score for this sample, if the evaluator
    /// stepped back to it.
    pub previous: Option<Score>,
}

impl SingleSession {
    pub fn new(user_name: String) -> Self {
        Self {
            user_name,
            model_index: 0,
            samples: Cursor::new(0),
            sheet: ScoreSheet::default(),
        }
    }

    /// The current sample, rolling over to the next model when the
    /// current one is exhausted. `None` means every model is done.
    pub fn position(&mut self, manifest: &Manifest) -> Option<SinglePosition> {
        loop {
            if self.model_index >= manifest.models.len() {
                return None;
            }
            let model = manifest.models[self.model_index].clone();
            let samples = manifest.valid_rows(&model);
            self.samples.resize(samples.len());
            if self.samples.is_done() {
                self.model_index += 1;
                self.samples = Cursor::new(0);
                continue;
            }
            let sample = &samples[self.samples.index()];
            let previous = self.sheet.get(&score_key(&model, &sample.audio_file));
            return Some(SinglePosition {
                model,
                model_index: self.model_index,
                model_total: manifest.models.len(),
                sample_index: self.samples.index(),
                sample_total: samples.len(),
                transcription: sample.transcription.clone(),
                audio_file: sample.audio_file.clone(),
                previous,
            });
        }
    }

    pub fn record(&mut self, model: &str, audio_file: &str, score: Score) {
        self.sheet.set(score_key(model, audio_file), score);
    }

    pub fn advance(&mut self) {
        self.samples.advance();
    }

    /// Step back one sample within the current model, clamped at 0.
    pub fn retreat(&mut self) {
        self.samples.retreat();
    }

    pub fn is_finished(&mut self, manifest: &Manifest) -> bool {
        self.position(manifest).is_none()
    }
}

// ---------------------------------------------------------------------------
// A/B comparison variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CompareSession {
    pub user_name: String,
    pairs: Vec<ModelPair>,
    pair_index: usize,
    samples: Cursor,
    /// Presentation order per (pair, sample), drawn once.
    orders: BTreeMap<(usize, usize), PresentationOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparePosition {
    pub pair_index: usize,
    pub pair_total: usize,
    pub sample_index: usize,
    pub sample_total: usize,
    pub baseline_model: String,
    pub experimental_model: String,
    pub transcription: String,
    pub baseline_file: String,
    pub experimental_file: String,
    pub order: PresentationOrder,
}

impl CompareSession {
    pub fn new(user_name: String, manifest: &Manifest) -> Self {
        Self {
            user_name,
            pairs: all_pairs(&manifest.models),
            pair_index: 0,
            samples: Cursor::new(0),
            orders: BTreeMap::new(),
        }
    }

    pub fn pair_total(&self) -> usize {
        self.pairs.len()
    }

    /// The current A/B sample, skipping exhausted or empty pairs.
    /// `None` means every pair is done.
    pub fn position<R: Rng>(
        &mut self,
        manifest: &Manifest,
        audio_root: Option<&Path>,
        rng: &mut R,
    ) -> Option<ComparePosition> {
        loop {
            if self.pair_index >= self.pairs.len() {
                return None;
            }
            let ModelPair {
                baseline,
                experimental,
            } = self.pairs[self.pair_index].clone();
            let samples = manifest.valid_pair_rows(&baseline, &experimental, audio_root);
            self.samples.resize(samples.len());
            if self.samples.is_done() {
                self.pair_index += 1;
                self.samples = Cursor::new(0);
                continue;
            }
            let sample = &samples[self.samples.index()];
            let order = *self
                .orders
                .entry((self.pair_index, self.samples.index()))
                .or_insert_with(|| PresentationOrder::draw(rng));
            return Some(ComparePosition {
                pair_index: self.pair_index,
                pair_total: self.pairs.len(),
                sample_index: self.samples.index(),
                sample_total: samples.len(),
                baseline_model: baseline,
                experimental_model: experimental,
                transcription: sample.transcription.clone(),
                baseline_file: sample.baseline_file.clone(),
                experimental_file: sample.experimental_file.clone(),
                order,
            });
        }
    }

    pub fn advance(&mut self) {
        self.samples.advance();
    }

    pub fn retreat(&mut self) {
        self.samples.retreat();
    }

    pub fn is_finished<R: Rng>(
        &mut self,
        manifest: &Manifest,
        audio_root: Option<&Path>,
        rng: &mut R,
    ) -> bool {
        self.position(manifest, audio_root, rng).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn manifest(content: &str) -> Manifest {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        Manifest::load(f.path()).unwrap()
    }

    #[test]
    fn cursor_clamps_both_ends() {
        let mut c = Cursor::new(2);
        c.retreat();
        assert_eq!(c.index(), 0);
        c.advance();
        c.advance();
        assert!(c.is_done());
        c.advance();
        assert_eq!(c.index(), 2);
        c.retreat();
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn empty_cursor_is_immediately_done() {
        let c = Cursor::new(0);
        assert!(c.is_done());
        assert!(c.is_empty());
    }

    #[test]
    fn cursor_resize_clamps_index() {
        let mut c = Cursor::new(5);
        c.advance();
        c.advance();
        c.advance();
        c.resize(2);
        assert_eq!(c.index(), 2);
        assert!(c.is_done());
    }

    #[test]
    fn single_walk_is_model_major() {
        let m = manifest("transcriptions,m1,m2\nr0,a0.wav,b0.wav\nr1,a1.wav,\n");
        let mut s = SingleSession::new("kay".into());

        let p = s.position(&m).unwrap();
        assert_eq!((p.model.as_str(), p.audio_file.as_str()), ("m1", "a0.wav"));
        assert_eq!(p.sample_total, 2);
        s.advance();

        let p = s.position(&m).unwrap();
        assert_eq!(p.audio_file, "a1.wav");
        s.advance();

        // m2 has a single valid row
        let p = s.position(&m).unwrap();
        assert_eq!((p.model.as_str(), p.audio_file.as_str()), ("m2", "b0.wav"));
        assert_eq!(p.sample_total, 1);
        s.advance();

        assert!(s.position(&m).is_none());
        assert!(s.is_finished(&m));
    }

    #[test]
    fn single_position_surfaces_previous_score_after_retreat() {
        let m = manifest("transcriptions,m\nr0,a0.wav\nr1,a1.wav\n");
        let mut s = SingleSession::new("kay".into());

        let p = s.position(&m).unwrap();
        s.record(&p.model, &p.audio_file, Score::new(64));
        s.advance();
        s.retreat();

        let p = s.position(&m).unwrap();
        assert_eq!(p.previous, Some(Score::new(64)));
    }

    #[test]
    fn single_skips_model_with_no_takes() {
        let m = manifest("transcriptions,empty,real\nr0,,x.wav\n");
        let mut s = SingleSession::new("kay".into());
        let p = s.position(&m).unwrap();
        assert_eq!(p.model, "real");
    }

    #[test]
    fn compare_skips_empty_pairs() {
        // Pair (a,b) shares no rows; pair (a,c) shares r0.
        let m = manifest("transcriptions,a,b,c\nr0,a0.wav,,c0.wav\nr1,,b1.wav,\n");
        let mut s = CompareSession::new("kay".into(), &m);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(s.pair_total(), 3);
        let p = s.position(&m, None, &mut rng).unwrap();
        assert_eq!(p.baseline_model, "a");
        assert_eq!(p.experimental_model, "c");
        s.advance();
        // (b,c) shares nothing either
        assert!(s.position(&m, None, &mut rng).is_none());
    }

    #[test]
    fn compare_presentation_order_is_stable_per_sample() {
        let m = manifest("transcriptions,a,b\nr0,a0.wav,b0.wav\nr1,a1.wav,b1.wav\n");
        let mut s = CompareSession::new("kay".into(), &m);
        let mut rng = StdRng::seed_from_u64(11);

        let first = s.position(&m, None, &mut rng).unwrap().order;
        // Re-render without advancing: same draw.
        let again = s.position(&m, None, &mut rng).unwrap().order;
        assert_eq!(first, again);

        s.advance();
        let _second = s.position(&m, None, &mut rng).unwrap();
        s.retreat();
        // Stepping back keeps the original draw too.
        assert_eq!(s.position(&m, None, &mut rng).unwrap().order, first);
    }

    #[test]
    fn score_sheet_sentinel_is_absence() {
        let mut sheet = ScoreSheet::default();
        assert_eq!(sheet.get(&score_key("m", "x.wav")), None);
        sheet.set(score_key("m", "x.wav"), Score::new(80));
        assert_eq!(sheet.get(&score_key("m", "x.wav")), Some(Score::new(80)));
        assert_eq!(sheet.len(), 1);
    }
}
