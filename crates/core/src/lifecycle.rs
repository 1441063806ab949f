//! Host-facing lifecycle adapter.
//!
//! The host (a windowing loop, a platform surface view) owns the context
//! and calls [`GameRenderer`]'s three entry points. The renderer forwards
//! them to a [`Game`] and keeps the ordering rules in one place:
//!
//! - no frame is drawn until `on_created` has succeeded,
//! - frames are skipped while the surface is 0×0,
//! - a second `surface_created` means the context was lost and every GPU
//!   object is gone, so `on_created` runs again.

/// The hooks a game implements.
pub trait Game {
    type Error;

    /// Called once per context. Build programs and upload buffers here.
    fn on_created(&mut self) -> Result<(), Self::Error>;

    /// Called when the surface size changes; update the viewport and
    /// projection here.
    fn on_surface_changed(&mut self, width: u32, height: u32);

    fn on_draw_frame(&mut self);
}

/// Current drawable surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or `None` for an empty surface.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// Drives a [`Game`] from host lifecycle callbacks.
#[derive(Debug)]
pub struct GameRenderer<G: Game> {
    game: G,
    created: bool,
    contexts: u32,
    size: SurfaceSize,
    frames: u64,
}

impl<G: Game> GameRenderer<G> {
    pub fn new(game: G) -> Self {
        Self {
            game,
            created: false,
            contexts: 0,
            size: SurfaceSize::default(),
            frames: 0,
        }
    }

    /// Forwards context creation to the game.
    ///
    /// If the game has already seen a surface size, it is re-sent after a
    /// successful creation so the new context gets a viewport.
    ///
    /// # Errors
    ///
    /// Returns the game's error. The renderer then draws nothing until a
    /// later `surface_created` succeeds.
    pub fn surface_created(&mut self) -> Result<(), G::Error> {
        self.created = false;
        if self.contexts > 0 {
            log::debug!("context recreated; rebuilding GPU resources");
        }
        self.contexts += 1;

        self.game.on_created()?;
        self.created = true;

        if !self.size.is_empty() {
            self.game.on_surface_changed(self.size.width, self.size.height);
        }
        Ok(())
    }

    /// Records the new surface size and forwards it once the game is created.
    pub fn surface_changed(&mut self, width: u32, height: u32) {
        self.size = SurfaceSize { width, height };
        if self.created {
            self.game.on_surface_changed(width, height);
        } else {
            log::debug!("surface resized to {width}x{height} before creation; deferred");
        }
    }

    /// Draws one frame if the game is created and the surface is non-empty.
    /// Returns whether the game was asked to draw.
    pub fn draw_frame(&mut self) -> bool {
        if !self.created {
            log::warn!("frame skipped: game not created");
            return false;
        }
        if self.size.is_empty() {
            log::trace!("frame skipped: empty surface");
            return false;
        }
        self.game.on_draw_frame();
        self.frames += 1;
        true
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    /// Frames drawn over the renderer's lifetime.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn into_game(self) -> G {
        self.game
    }
}
