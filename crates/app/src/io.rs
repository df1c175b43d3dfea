//! `.npy` array glue for the CLI. Decoding beyond `.npy` is the caller's
//! problem — the drivers only ever see numeric arrays.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Axis};
use ndarray_npy::{read_npy, write_npy};

/// Load a `[C, H, W]` image. A 2-D `[H, W]` file is promoted to a
/// single-channel image.
pub fn load_image(path: &Path) -> Result<Array3<f32>> {
    if let Ok(image) = read_npy::<_, Array3<f32>>(path) {
        return Ok(image);
    }
    let image: Array2<f32> =
        read_npy(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(image.insert_axis(Axis(0)))
}

/// Load an `[H, D, W]` volume.
pub fn load_volume(path: &Path) -> Result<Array3<f32>> {
    read_npy(path).with_context(|| format!("reading volume {}", path.display()))
}

pub fn save_array<D: ndarray::Dimension>(
    path: &Path,
    array: &ndarray::Array<f32, D>,
) -> Result<()> {
    write_npy(path, array).with_context(|| format!("writing {}", path.display()))
}

/// Expand `input` into a sorted list of `.npy` files: the path itself if it
/// is a file, otherwise every `.npy` directly inside the directory.
pub fn collect_npy_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths = Vec::new();
    let entries = std::fs::read_dir(input)
        .with_context(|| format!("listing input directory {}", input.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "npy") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_image_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.npy");

        let image = Array3::from_shape_fn((3, 4, 5), |(c, y, x)| (c + y + x) as f32);
        save_array(&path, &image).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_grayscale_promoted_to_single_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.npy");

        let image = Array2::from_shape_fn((4, 5), |(y, x)| (y * 10 + x) as f32);
        save_array(&path, &image).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.dim(), (1, 4, 5));
        assert_eq!(loaded[[0, 2, 3]], 23.0);
    }

    #[test]
    fn test_collect_inputs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.npy", "a.npy", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let inputs = collect_npy_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.npy", "b.npy"]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol.npy");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(collect_npy_inputs(&path).unwrap(), vec![path]);
    }
}
