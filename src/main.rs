// SPDX-License-Identifier: MPL-2.0

//! Overlay implementation using the Wayland layer-shell protocol.
//! Layer surfaces have no decorations, stay above normal windows and are
//! never listed by task switchers.

use std::time::Duration;

use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState, Region},
    delegate_compositor, delegate_layer, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm,
    output::{OutputHandler, OutputState},
    reexports::{
        calloop::{channel, EventLoop},
        calloop_wayland_source::WaylandSource,
    },
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::{registry_queue_init, GlobalList},
    protocol::{wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

use temp_glass::signals::ShutdownSignals;
use temp_glass::widget::geometry::FALLBACK_DISPLAY_WIDTH;
use temp_glass::widget::render;
use temp_glass::widget::{
    display_state, rounded_region, AggregateReading, DisplayReader, DragController, PaintStyle,
    PointerButton, RedrawRequester, SamplingScheduler, SensorAggregator, SysinfoProvider,
    WindowGeometry,
};
use temp_glass::{Config, OverlayError, RenderError};

const NAMESPACE: &str = "temp-glass";

/// How long shutdown waits for the sampling loop to notice cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Message asking the event loop to repaint.
struct RedrawRequest;

/// Message asking the event loop to exit, sent on SIGINT or SIGTERM.
struct CloseRequest;

/// Thread-safe handle that queues a repaint on the event loop.
#[derive(Clone)]
struct RedrawHandle(channel::Sender<RedrawRequest>);

impl RedrawRequester for RedrawHandle {
    fn request_redraw(&self) {
        // Fails only once the event loop is gone, then there is nothing to paint
        let _ = self.0.send(RedrawRequest);
    }
}

/// Styling needs a live surface, which exists only after the first configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unstyled,
    Styled,
}

struct OverlayWindow {
    registry_state: RegistryState,
    output_state: OutputState,
    compositor_state: CompositorState,
    shm_state: Shm,
    layer_shell: LayerShell,
    seat_state: SeatState,

    /// The main surface for rendering
    layer_surface: Option<LayerSurface>,
    pointer: Option<wl_pointer::WlPointer>,
    phase: Phase,

    config: Config,
    style: PaintStyle,
    geometry: WindowGeometry,

    /// Horizontal drag state
    drag: DragController,

    /// Latest temperature text, written by the sampler
    display: DisplayReader,
    redraw_tx: channel::Sender<RedrawRequest>,

    /// Memory pool for rendering
    pool: Option<SlotPool>,

    /// Exit flag
    exit: bool,
}

impl CompositorHandler for OverlayWindow {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.draw();
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for OverlayWindow {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }
}

impl LayerShellHandler for OverlayWindow {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        log::info!("Overlay surface closed by the compositor");
        self.layer_surface = None;
        self.exit = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        _configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        // We always keep our own fixed size
        if self.phase == Phase::Unstyled {
            self.apply_styling();
        }
        self.draw();
    }
}

impl SeatHandler for OverlayWindow {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(e) => log::warn!("No pointer available, dragging disabled: {}", e),
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
            self.drag.release();
        }
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}
}

impl PointerHandler for OverlayWindow {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        let Some(surface) = self.layer_surface.as_ref().map(|ls| ls.wl_surface().clone()) else {
            return;
        };

        for event in events {
            if event.surface != surface {
                continue;
            }

            let x = event.position.0 as i32;
            match event.kind {
                PointerEventKind::Press { button, .. } => {
                    self.drag.press(PointerButton::from(button), x, self.geometry.x);
                }
                PointerEventKind::Release { .. } => self.drag.release(),
                PointerEventKind::Motion { .. } => {
                    if let Some(left) = self.drag.motion_surface(x, self.geometry.x) {
                        self.move_to(left);
                    }
                }
                _ => {}
            }
        }
    }
}

impl ShmHandler for OverlayWindow {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

impl OverlayWindow {
    fn new(
        globals: &GlobalList,
        qh: &QueueHandle<Self>,
        config: Config,
        display: DisplayReader,
        redraw_tx: channel::Sender<RedrawRequest>,
    ) -> Result<Self, OverlayError> {
        let registry_state = RegistryState::new(globals);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh)?;
        let shm_state = Shm::bind(globals, qh)?;
        let layer_shell = LayerShell::bind(globals, qh)?;
        let seat_state = SeatState::new(globals, qh);

        Ok(Self {
            registry_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell,
            seat_state,
            layer_surface: None,
            pointer: None,
            phase: Phase::Unstyled,
            style: PaintStyle::from(&config),
            geometry: WindowGeometry::centered_top(FALLBACK_DISPLAY_WIDTH, &config),
            drag: DragController::new(),
            config,
            display,
            redraw_tx,
            pool: None,
            exit: false,
        })
    }

    /// Handle for requesting repaints from other threads.
    fn redraw_handle(&self) -> RedrawHandle {
        RedrawHandle(self.redraw_tx.clone())
    }

    /// Width of the first output the compositor described.
    fn primary_display_width(&self) -> i32 {
        self.output_state
            .outputs()
            .find_map(|output| {
                let info = self.output_state.info(&output)?;
                info.logical_size.map(|(width, _)| width).or_else(|| {
                    info.modes
                        .iter()
                        .find(|mode| mode.current)
                        .map(|mode| mode.dimensions.0)
                })
            })
            .unwrap_or(FALLBACK_DISPLAY_WIDTH)
    }

    /// Create the overlay surface, centered at the top of the primary
    /// display. Outputs must be known, so call this after a roundtrip.
    fn create_layer_surface(&mut self, qh: &QueueHandle<Self>) {
        let display_width = self.primary_display_width();
        self.geometry = WindowGeometry::centered_top(display_width, &self.config);
        if self.config.clamp_drag {
            let (min, max) = self.geometry.left_bounds(display_width);
            self.drag = DragController::with_bounds(min, max);
        }

        let surface = self.compositor_state.create_surface(qh);
        let layer_surface = self.layer_shell.create_layer_surface(
            qh,
            surface,
            Layer::Overlay,
            Some(NAMESPACE),
            None,
        );

        layer_surface.set_anchor(Anchor::TOP | Anchor::LEFT);
        layer_surface.set_size(self.geometry.width, self.geometry.height);
        layer_surface.set_exclusive_zone(-1); // Don't reserve space
        layer_surface.set_margin(self.geometry.y, 0, 0, self.geometry.x);
        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer_surface.commit();

        log::info!(
            "Overlay placed at x={} y={} on a {} px wide display",
            self.geometry.x,
            self.geometry.y,
            display_width
        );
        self.layer_surface = Some(layer_surface);
    }

    /// Clip input to the rounded shape and mark the surface translucent.
    /// Failures only cost cosmetics.
    fn apply_styling(&mut self) {
        let Some(layer_surface) = &self.layer_surface else {
            return;
        };
        let surface = layer_surface.wl_surface();

        match Region::new(&self.compositor_state) {
            Ok(region) => {
                let rects = rounded_region(
                    self.geometry.width,
                    self.geometry.height,
                    self.geometry.corner_radius,
                );
                for rect in &rects {
                    region.add(rect.x, rect.y, rect.width, rect.height);
                }
                surface.set_input_region(Some(region.wl_region()));
            }
            Err(e) => log::warn!("Could not create input region, corners stay clickable: {}", e),
        }
        surface.set_opaque_region(None);

        self.phase = Phase::Styled;
        log::info!("Overlay styled");
    }

    fn move_to(&mut self, left: i32) {
        if left == self.geometry.x {
            return;
        }
        self.geometry.x = left;

        if let Some(layer_surface) = &self.layer_surface {
            layer_surface.set_margin(self.geometry.y, 0, 0, left);
            layer_surface.commit();
        }
    }

    fn draw(&mut self) {
        if self.phase != Phase::Styled {
            return;
        }
        let Some(layer_surface) = self.layer_surface.clone() else {
            return;
        };

        if let Err(e) = self.paint(&layer_surface) {
            log::warn!("Failed to paint overlay: {}", e);
        }
    }

    fn paint(&mut self, layer_surface: &LayerSurface) -> Result<(), RenderError> {
        let width = self.geometry.width as i32;
        let height = self.geometry.height as i32;
        let stride = width * 4;

        if self.pool.is_none() {
            let pool = SlotPool::new((stride * height) as usize, &self.shm_state)
                .map_err(|e| RenderError::Buffer(e.to_string()))?;
            self.pool = Some(pool);
        }
        let pool = self
            .pool
            .as_mut()
            .ok_or_else(|| RenderError::Buffer(String::from("pool missing")))?;

        let (buffer, canvas) = pool
            .create_buffer(width, height, stride, wl_shm::Format::Argb8888)
            .map_err(|e| RenderError::Buffer(e.to_string()))?;

        let value = self.display.snapshot();
        render::paint_canvas(canvas, width, height, &self.style, &value)?;

        let surface = layer_surface.wl_surface();
        surface.attach(Some(buffer.wl_buffer()), 0, 0);
        surface.damage_buffer(0, 0, width, height);
        surface.commit();

        Ok(())
    }
}

delegate_compositor!(OverlayWindow);
delegate_output!(OverlayWindow);
delegate_shm!(OverlayWindow);
delegate_seat!(OverlayWindow);
delegate_pointer!(OverlayWindow);
delegate_layer!(OverlayWindow);

delegate_registry!(OverlayWindow);

impl ProvidesRegistryState for OverlayWindow {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }
    registry_handlers![OutputState, SeatState];
}

fn main() -> Result<(), OverlayError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::default();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("temp-glass-sampler")
        .enable_all()
        .build()?;
    let mut signals = {
        let _guard = runtime.enter();
        ShutdownSignals::install()?
    };

    // Connect to Wayland
    let conn = Connection::connect_to_env()?;
    let (globals, mut event_queue) = registry_queue_init(&conn)?;
    let qh = event_queue.handle();

    let mut event_loop: EventLoop<OverlayWindow> = EventLoop::try_new()?;
    let (redraw_tx, redraw_rx) = channel::channel();
    let (close_tx, close_rx) = channel::channel();
    let (display_writer, display_reader) = display_state(AggregateReading::zero().text());

    let mut window = OverlayWindow::new(&globals, &qh, config.clone(), display_reader, redraw_tx)?;

    // Learn the outputs before placing the overlay
    event_queue.roundtrip(&mut window)?;
    window.create_layer_surface(&qh);

    WaylandSource::new(conn, event_queue)
        .insert(event_loop.handle())
        .map_err(|e| e.error)?;
    event_loop
        .handle()
        .insert_source(redraw_rx, |event, _, window: &mut OverlayWindow| {
            if let channel::Event::Msg(RedrawRequest) = event {
                window.draw();
            }
        })
        .map_err(|e| e.error)?;
    event_loop
        .handle()
        .insert_source(close_rx, |event, _, window: &mut OverlayWindow| {
            if let channel::Event::Msg(CloseRequest) = event {
                window.exit = true;
            }
        })
        .map_err(|e| e.error)?;

    runtime.spawn(async move {
        let name = signals.recv().await;
        log::info!("{} received, closing overlay", name);
        let _ = close_tx.send(CloseRequest);
    });

    let scheduler = SamplingScheduler::spawn(
        runtime.handle(),
        SensorAggregator::open(SysinfoProvider::new()),
        config.sample_interval,
        display_writer,
        window.redraw_handle(),
    );

    // Main event loop
    while !window.exit {
        event_loop.dispatch(None, &mut window)?;
    }

    log::info!("Stopping temperature sampling");
    scheduler.shutdown_within(runtime, SHUTDOWN_GRACE);

    Ok(())
}
