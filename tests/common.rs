/// Shared helpers: test vector loading and synthetic recordings.
use anyhow::{bail, Context, Result};
use exg_csd::{ChannelInfo, MeasInfo, Raw};
use ndarray::{Array, Array2, IxDyn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[allow(unused)]
pub fn vectors_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("vectors")
}

#[allow(unused)]
pub fn vector_path(name: &str) -> PathBuf {
    vectors_dir().join(format!("{name}.safetensors"))
}

#[allow(unused)]
/// Load all numeric tensors of `tests/vectors/{name}.safetensors` as f64.
/// Handles F32, F64, I32, I64.
pub fn load_vectors_f64(name: &str) -> Result<HashMap<String, Array<f64, IxDyn>>> {
    let path = vector_path(name);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("test vector not found: {}", path.display()))?;
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }

    let n = u64::from_le_bytes(bytes[..8].try_into()?) as usize;
    let header: serde_json::Value = serde_json::from_slice(&bytes[8..8 + n])?;
    let data_start = 8 + n;

    let mut out = HashMap::new();
    for (key, val) in header.as_object().context("header is not an object")? {
        if key == "__metadata__" { continue; }
        let dtype = val["dtype"].as_str().context("missing dtype")?;
        let offsets = val["data_offsets"].as_array().context("missing data_offsets")?;
        let s = offsets[0].as_u64().context("bad offset")? as usize;
        let e = offsets[1].as_u64().context("bad offset")? as usize;
        let raw = &bytes[data_start + s..data_start + e];
        let shape: Vec<usize> = val["shape"].as_array().context("missing shape")?
            .iter().filter_map(|v| v.as_u64()).map(|v| v as usize).collect();

        let vals: Vec<f64> = match dtype {
            "F32" => raw.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            "F64" => raw.chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            "I32" => raw.chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            "I64" => raw.chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
                .collect(),
            _ => continue,
        };

        let arr = Array::from_shape_vec(IxDyn(&shape), vals)?;
        out.insert(key.clone(), arr);
    }
    Ok(out)
}

#[allow(unused)]
/// `n` electrode positions spread over the upper part of a sphere of
/// `radius` centred at `origin` (golden-angle spiral).
pub fn spiral_positions(n: usize, origin: [f64; 3], radius: f64) -> Vec<[f64; 3]> {
    (0..n)
        .map(|i| {
            let az = i as f64 * 2.399_963;
            let el = 0.1 + 1.35 * (i as f64 + 0.5) / n as f64;
            [
                origin[0] + radius * el.cos() * az.cos(),
                origin[1] + radius * el.cos() * az.sin(),
                origin[2] + radius * el.sin(),
            ]
        })
        .collect()
}

#[allow(unused)]
/// MEG + stim + EOG + `n_eeg` EEG channels, like `test_raw.fif`.
pub fn mixed_info(n_eeg: usize) -> MeasInfo {
    let mut chs = vec![
        ChannelInfo::mag("MEG 0111"),
        ChannelInfo::mag("MEG 0121"),
        ChannelInfo::stim("STI 014"),
    ];
    for (i, p) in spiral_positions(n_eeg, [0.0, 0.0, 0.04], 0.09).into_iter().enumerate() {
        chs.push(ChannelInfo::eeg(&format!("EEG {:03}", i + 1), p));
    }
    chs.push(ChannelInfo::eog("EOG 061"));
    let mut info = MeasInfo::new(chs, 600.0);
    info.lowpass = Some(172.0);
    info.highpass = Some(0.1);
    info.line_freq = Some(60.0);
    info.description = Some("synthetic".into());
    info
}

#[allow(unused)]
/// Deterministic pseudo-signal, `[C, T]`, amplitude ~10 µV.
pub fn signal(n_ch: usize, n_t: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
        let c = c as f64;
        let t = t as f64;
        1e-5 * ((0.37 * c + 0.05 * t).sin() + 0.5 * (1.3 * c - 0.11 * t).cos())
            + 1e-6 * (0.7 * c * c).sin()
    })
}

#[allow(unused)]
pub fn mixed_raw(n_eeg: usize, n_t: usize) -> Raw {
    let info = mixed_info(n_eeg);
    let data = signal(info.n_chan, n_t);
    Raw::new(info, data).expect("consistent raw")
}

#[allow(unused)]
/// Route `log` output through the test harness (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
