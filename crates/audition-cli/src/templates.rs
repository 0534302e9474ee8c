//! Embedded scaffolding written by `audition init`.

pub const SAMPLE_MANIFEST_CSV: &str = "\
transcriptions,base_v1,exp_v2
The quick brown fox jumps over the lazy dog.,fox_base.wav,fox_exp.wav
She sells seashells by the seashore.,shells_base.wav,shells_exp.wav
How much wood would a woodchuck chuck?,wood_base.wav,
";

pub const AUDITION_CONFIG_DEFAULT_YAML: &str = "\
version: 1
# Sample manifest: one `transcriptions` column plus one column per model.
manifest: app_input/csv/list.csv
# One subfolder of clips per model; calibration clips go in `test/`.
audio_dir: app_input/audios
out_dir: app_output
port: 8787
";
