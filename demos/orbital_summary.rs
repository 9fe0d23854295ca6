//! Demo that walks through orbitals the way a viewer would and reports what it builds.
//!
//! Usage: `cargo run --example orbital_summary -- [n l m] [options.json]`
//!
//! Set `RUST_LOG=debug` to see isovalues and timings from the builders.

use std::time::Instant;

use atomview::{
    init_logging, BuildOptions, Rendered, Result, ViewState, ViewUpdate, VisMode,
};

fn describe(view: &ViewState, options: &BuildOptions) -> Result<()> {
    let start = Instant::now();
    let rendered = view.render(options)?;
    let elapsed = start.elapsed();
    match rendered {
        Rendered::Contour(mesh) => {
            let lobes = mesh.connected_components().len();
            println!(
                "{:<24} contour  {:>7} tris ({:>5} cap)  {lobes} piece(s)  iso {:.3e}  [{elapsed:.0?}]",
                view.state().to_string(),
                mesh.num_triangles(),
                mesh.cap_triangles().len(),
                mesh.isovalue(),
            );
        }
        Rendered::Volume(volume) => {
            let visible = volume.voxels().iter().filter(|v| v.a > 0).count();
            println!(
                "{:<24} volume   {:>7} voxels, {visible} visible  max |ψ|² {:.3e}  [{elapsed:.0?}]",
                view.state().to_string(),
                volume.len(),
                volume.max_density(),
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match args.get(3) {
        Some(path) => BuildOptions::load(path)?,
        None => BuildOptions::default(),
    };

    let mut view = ViewState::default();
    view.num_pts = 60;

    if args.len() >= 3 {
        let parse = |s: &str| s.parse::<i64>().unwrap_or(-1);
        let (n, l, m) = (parse(&args[0]), parse(&args[1]), parse(&args[2]));
        view.apply(ViewUpdate::SetN(u32::try_from(n).unwrap_or(0)))?;
        view.apply(ViewUpdate::SetL(u32::try_from(l).unwrap_or(u32::MAX)))?;
        view.apply(ViewUpdate::SetM(i32::try_from(m).unwrap_or(i32::MAX)))?;
        for mode in [VisMode::Contour, VisMode::Volume] {
            view.apply(ViewUpdate::SetMode(mode))?;
            describe(&view, &options)?;
        }
        return Ok(());
    }

    // Same sequence of clicks as exploring the first three shells.
    let clicks = [
        ViewUpdate::SetN(2),
        ViewUpdate::SetL(1),
        ViewUpdate::SetBasis(atomview::Basis::Real),
        ViewUpdate::SetM(-1),
        ViewUpdate::SetCutout(true),
        ViewUpdate::SetN(3),
        ViewUpdate::SetL(2),
        ViewUpdate::SetM(2),
        ViewUpdate::SetMode(VisMode::Volume),
        ViewUpdate::SetN(1),
    ];
    describe(&view, &options)?;
    for click in clicks {
        view.apply(click)?;
        describe(&view, &options)?;
    }
    Ok(())
}
