// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for multi-mesh files on disk.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use strata_core::renderer::ComponentType;
use strata_data::mesh::{
    highest_multi_id, is_multi, MeshBlock, MeshBuilder, MeshBuilderEntry, MeshError,
    NO_BOUNDS_ENTRY,
};

fn mesh_with_marker(marker: u8) -> MeshBlock {
    let data = [marker; 16];
    let mut builder = MeshBuilder::new();
    builder.set_vertex_buffer(&[MeshBuilderEntry::new("m", &data, ComponentType::U8, 4)]);
    builder.add_mesh_subset("s", 4, 0, NO_BOUNDS_ENTRY);
    builder.get_mesh().map(MeshBlock::clone).expect("valid mesh")
}

#[test]
fn test_append_and_reload_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("meshes.mesh");

    let mut ids = Vec::new();
    for marker in 1..=3u8 {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        ids.push(mesh_with_marker(marker).save_multi(&mut file, 0)?);
    }
    assert_eq!(ids, vec![1, 2, 3]);

    let mut file = OpenOptions::new().read(true).open(&path)?;
    assert!(is_multi(&mut file));
    assert_eq!(highest_multi_id(&mut file)?, 3);

    let latest = MeshBlock::load_multi(&mut file, 0)?;
    assert_eq!(latest.vertex_data(), &[3u8; 16]);
    let first = MeshBlock::load_multi(&mut file, 1)?;
    assert_eq!(first.vertex_data(), &[1u8; 16]);
    Ok(())
}

#[test]
fn test_explicit_ids_and_collisions() -> anyhow::Result<()> {
    let mut file = tempfile::tempfile()?;
    let mesh = mesh_with_marker(7);
    assert_eq!(mesh.save_multi(&mut file, 42)?, 42);
    assert!(matches!(
        mesh.save_multi(&mut file, 42),
        Err(MeshError::DuplicateMeshId(42))
    ));
    assert_eq!(mesh.save_multi(&mut file, 0)?, 43);
    assert!(matches!(
        MeshBlock::load_multi(&mut file, 5),
        Err(MeshError::MeshIdNotFound(5))
    ));
    Ok(())
}

#[test]
fn test_single_mesh_file_is_not_multi() -> anyhow::Result<()> {
    let mut file = tempfile::tempfile()?;
    mesh_with_marker(1).save(&mut file)?;
    file.flush()?;
    assert!(!is_multi(&mut file));
    assert!(matches!(
        MeshBlock::load_multi(&mut file, 0),
        Err(MeshError::NotMulti)
    ));

    // Loading it as a plain mesh still works.
    file.seek(SeekFrom::Start(0))?;
    let block = MeshBlock::load(&mut file)?;
    assert_eq!(block.vertex_data(), &[1u8; 16]);
    Ok(())
}
