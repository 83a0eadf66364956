use crate::{
    map::{
        grid::{Corner, GridPoint},
        TileMap,
    },
    render::{MapRenderer, Palette},
};
use svg::{
    node::{
        element::{Group, Polyline, Rectangle},
        Comment,
    },
    Document,
};

/// Render a map as an SVG. This is a 2D top-down rendering where each cell
/// is split into 4 quadrants, one per corner. Overlays are drawn over the
/// quadrants their corner code covers.
pub fn map_to_svg(
    map: &TileMap,
    renderer: &MapRenderer,
    palette: &Palette,
) -> Document {
    let config = map.config();
    let cell_size = renderer.render_config().cell_size;
    let mut document = Document::new()
        .set(
            "viewBox",
            (
                0.0,
                0.0,
                config.width as f64 * cell_size,
                config.height as f64 * cell_size,
            ),
        )
        .set("shape-rendering", "crispEdges")
        .add(Comment::new(format!("\n{:#?}\n", map.report())));

    let mut terrain = Group::new().set("id", "terrain");
    for (cell, base) in map.base().iter() {
        for corner in Corner::ALL {
            let color = renderer.quadrant_color(
                map,
                palette,
                cell.corner(corner),
                base,
            );
            terrain = terrain.add(
                quadrant(renderer, cell, corner).set("fill", color.to_html()),
            );
        }
    }
    document = document.add(terrain);

    if renderer.render_config().show_overlays {
        let mut overlays = Group::new().set("id", "overlays");
        for (cell, tile) in map.overlays().iter() {
            if let Some(tile) = tile {
                let color = palette.overlay(tile.kind).to_html();
                for corner in Corner::ALL {
                    if tile.code.contains(corner) {
                        overlays = overlays.add(
                            quadrant(renderer, cell, corner)
                                .set("fill", color.clone()),
                        );
                    }
                }
            }
        }
        document = document.add(overlays);
    }

    if renderer.render_config().show_routes {
        for route in map.routes() {
            if route.cells.is_empty() {
                continue;
            }
            let points = route
                .cells
                .iter()
                .map(|cell| {
                    let center = renderer.cell_center(*cell);
                    (center.x, center.y)
                })
                .collect::<Vec<_>>();
            document = document.add(
                Polyline::new()
                    .set("points", points)
                    .set("fill", "none")
                    .set("stroke", "#000000")
                    .set("stroke-width", cell_size / 8.0),
            );
        }
    }

    document
}

/// The square covering one corner's quarter of a cell
fn quadrant(
    renderer: &MapRenderer,
    cell: GridPoint,
    corner: Corner,
) -> Rectangle {
    let half = renderer.render_config().cell_size / 2.0;
    let origin = renderer.screen_position(cell);
    let (dx, dy) = corner.offset();
    Rectangle::new()
        .set("x", origin.x + dx as f64 * half)
        .set("y", origin.y + dy as f64 * half)
        .set("width", half)
        .set("height", half)
}
