use std::io::Write;

use crate::asset_pipeline::materials::MaterialData;
use crate::export::path_mode::TextureReferencer;
use crate::export::statement_name;

const INDEX_OF_REFRACTION: f32 = 1.45;

pub fn write_mtl<W: Write>(
    out: &mut W,
    materials: &[&MaterialData],
    textures: &TextureReferencer,
) -> anyhow::Result<()> {
    writeln!(out, "# scene-split MTL File")?;
    writeln!(out, "# Material Count: {}", materials.len())?;

    for material in materials {
        let shininess = (1.0 - material.roughness).powi(2) * 1000.0;
        let [r, g, b, alpha] = material.base_color.to_array();
        let [er, eg, eb] = material.emissive.to_array();

        writeln!(out)?;
        writeln!(out, "newmtl {}", statement_name(&material.name))?;
        writeln!(out, "Ns {:.6}", shininess)?;
        writeln!(out, "Ka 1.000000 1.000000 1.000000")?;
        writeln!(out, "Kd {:.6} {:.6} {:.6}", r, g, b)?;
        writeln!(out, "Ks 0.500000 0.500000 0.500000")?;
        writeln!(out, "Ke {:.6} {:.6} {:.6}", er, eg, eb)?;
        writeln!(out, "Ni {:.6}", INDEX_OF_REFRACTION)?;
        writeln!(out, "d {:.6}", alpha)?;
        writeln!(out, "illum 2")?;
        writeln!(out, "Pr {:.6}", material.roughness)?;
        writeln!(out, "Pm {:.6}", material.metallic)?;

        for (statement, texture) in material.texture_slots() {
            if let Some(reference) = textures.reference(texture)? {
                writeln!(out, "{} {}", statement, reference)?;
            }
        }
    }

    Ok(())
}
