// THEORY:
// The `tile` module is the spatial bridge between a raw image and the mosaic.
// It answers one question: "which rectangle of the source image belongs to the
// tile at (row, col)?"
//
// Key architectural principles:
// 1.  **Row-Major Grid**: The image is cut into `ceil(H / th)` rows of
//     `ceil(W / tw)` columns. Rows are the unit of work for everything
//     downstream, so the grid is exposed row by row.
// 2.  **Edge Clipping**: Tiles on the right and bottom edges are shrunk to fit the
//     image. The union of all tiles covers the image exactly once: no gaps, no
//     overlap, no reads outside the image.
// 3.  **Laziness**: `TileGrid` stores only the dimensions. Rows and their tiles are
//     produced on demand by iterators, so a huge image costs nothing until it is
//     walked.
// 4.  **Dumb Data**: `Tile` is a plain descriptor. It never touches pixels; reading
//     the region is the job of a `PixelSource`.

pub mod tile {
    use crate::{MosaicError, Result};

    /// The default tile edge length in pixels, used for both dimensions.
    pub const DEFAULT_TILE_EDGE: u32 = 16;

    /// The nominal size of a mosaic tile. Edge tiles may be smaller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TileSize {
        /// Nominal tile width in pixels.
        pub width: u32,
        /// Nominal tile height in pixels.
        pub height: u32,
    }

    impl TileSize {
        pub fn new(width: u32, height: u32) -> Result<Self> {
            if width == 0 || height == 0 {
                return Err(MosaicError::InvalidTileSize { width, height });
            }
            Ok(Self { width, height })
        }
    }

    impl Default for TileSize {
        /// 16×16 pixels.
        fn default() -> Self {
            Self {
                width: DEFAULT_TILE_EDGE,
                height: DEFAULT_TILE_EDGE,
            }
        }
    }

    /// A rectangular sub-region of the source image, clipped at the image edges.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Tile {
        /// The row index of this tile in the grid.
        pub row: u32,
        /// The column index of this tile in the grid.
        pub col: u32,
        /// Left edge of the tile in image pixels.
        pub x: u32,
        /// Top edge of the tile in image pixels.
        pub y: u32,
        /// Clipped width: `min(tile_width, image_width - x)`.
        pub width: u32,
        /// Clipped height: `min(tile_height, image_height - y)`.
        pub height: u32,
    }

    /// Partitions an `image_width × image_height` surface into a row-major grid of tiles.
    #[derive(Debug, Clone, Copy)]
    pub struct TileGrid {
        image_width: u32,
        image_height: u32,
        tile_size: TileSize,
    }

    impl TileGrid {
        pub fn new(image_width: u32, image_height: u32, tile_size: TileSize) -> Result<Self> {
            // `TileSize` can be built literally, so validate again here.
            let tile_size = TileSize::new(tile_size.width, tile_size.height)?;
            Ok(Self {
                image_width,
                image_height,
                tile_size,
            })
        }

        pub fn tile_size(&self) -> TileSize {
            self.tile_size
        }

        /// Number of tile rows, `ceil(image_height / tile_height)`.
        pub fn row_count(&self) -> u32 {
            self.image_height.div_ceil(self.tile_size.height)
        }

        /// Number of tiles per row, `ceil(image_width / tile_width)`.
        pub fn col_count(&self) -> u32 {
            self.image_width.div_ceil(self.tile_size.width)
        }

        /// Builds the descriptor for the tile at `(row, col)`, or `None` outside the grid.
        pub fn tile(&self, row: u32, col: u32) -> Option<Tile> {
            if row >= self.row_count() || col >= self.col_count() {
                return None;
            }
            let x = col * self.tile_size.width;
            let y = row * self.tile_size.height;
            Some(Tile {
                row,
                col,
                x,
                y,
                width: self.tile_size.width.min(self.image_width - x),
                height: self.tile_size.height.min(self.image_height - y),
            })
        }

        /// The tiles of one row, in column order. Empty for a row outside the grid.
        pub fn row(&self, row: u32) -> impl Iterator<Item = Tile> + '_ {
            (0..self.col_count()).filter_map(move |col| self.tile(row, col))
        }

        /// Every row of the grid, top to bottom; each row yields its tiles lazily.
        pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = Tile> + '_> + '_ {
            (0..self.row_count()).map(move |row| self.row(row))
        }
    }
}
