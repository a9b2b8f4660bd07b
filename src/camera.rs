//! First-person camera, its projection and the controller that drives it.
//!
//! The camera stores position, yaw, pitch and zoom; the zoom doubles as the
//! vertical field of view handed to [`Projection::calc_matrix`].

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// wgpu clip space has z in [0, 1], cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const YAW: cgmath::Deg<f32> = cgmath::Deg(-90.0);
pub const PITCH: cgmath::Deg<f32> = cgmath::Deg(0.0);
pub const SPEED: f32 = 2.5;
pub const SENSITIVITY: f32 = 0.1;
pub const ZOOM: cgmath::Deg<f32> = cgmath::Deg(45.0);
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 100.0;

const MAX_PITCH: f32 = 89.0;
const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub zoom: cgmath::Deg<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            zoom: ZOOM,
        }
    }

    /// Unit view direction.
    pub fn front(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(Vector3::unit_y()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.front()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), self.up())
    }
}

impl Default for Camera {
    /// At (0, 0, 3) looking down -z.
    fn default() -> Self {
        Self::new((0.0, 0.0, 3.0), YAW, PITCH)
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self, fovy: impl Into<Rad<f32>>) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera block of the shaders: eye position (w unused) and view-projection.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix(camera.zoom) * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyboard, mouse and scroll input accumulated between frames.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Returns whether the key moves the camera.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed {
            1.0
        } else {
            0.0
        };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.amount_right = amount;
                true
            }
            _ => false,
        }
    }

    /// Raw mouse motion; `dy` grows downwards.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.handle_key(*key, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(delta),
            _ => {}
        }
    }

    /// Apply the input gathered since the last frame.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let velocity = self.speed * dt.as_secs_f32();
        let front = camera.front();
        let right = camera.right();
        camera.position += front * (self.amount_forward - self.amount_backward) * velocity;
        camera.position += right * (self.amount_right - self.amount_left) * velocity;

        let yaw = cgmath::Deg::from(camera.yaw).0 + self.rotate_horizontal * self.sensitivity;
        let pitch = (cgmath::Deg::from(camera.pitch).0 - self.rotate_vertical * self.sensitivity)
            .clamp(-MAX_PITCH, MAX_PITCH);
        camera.yaw = cgmath::Deg(yaw).into();
        camera.pitch = cgmath::Deg(pitch).into();
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        camera.zoom = cgmath::Deg((camera.zoom.0 - self.scroll).clamp(MIN_ZOOM, MAX_ZOOM));
        self.scroll = 0.0;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(SPEED, SENSITIVITY)
    }
}

/// The camera and the GPU objects its uniform lives in.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: CameraController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        let front = camera.front();
        assert!(close(front.x, 0.0) && close(front.y, 0.0) && close(front.z, -1.0));
        let right = camera.right();
        assert!(close(right.x, 1.0) && close(right.z, 0.0));
    }

    #[test]
    fn forward_key_moves_along_front_at_speed() {
        let mut camera = Camera::default();
        let mut controller = CameraController::default();
        assert!(controller.handle_key(KeyCode::KeyW, ElementState::Pressed));
        controller.update(&mut camera, Duration::from_secs(2));
        assert!(close(camera.position.z, 3.0 - 2.0 * SPEED));

        controller.handle_key(KeyCode::KeyW, ElementState::Released);
        controller.update(&mut camera, Duration::from_secs(2));
        assert!(close(camera.position.z, 3.0 - 2.0 * SPEED));
        assert!(!controller.handle_key(KeyCode::KeyQ, ElementState::Pressed));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        let mut controller = CameraController::default();
        controller.handle_mouse(0.0, -10_000.0);
        controller.update(&mut camera, Duration::ZERO);
        assert!(close(cgmath::Deg::from(camera.pitch).0, 89.0));

        controller.handle_mouse(0.0, 20_000.0);
        controller.update(&mut camera, Duration::ZERO);
        assert!(close(cgmath::Deg::from(camera.pitch).0, -89.0));
    }

    #[test]
    fn mouse_turns_by_sensitivity() {
        let mut camera = Camera::default();
        let mut controller = CameraController::default();
        controller.handle_mouse(100.0, 0.0);
        controller.update(&mut camera, Duration::ZERO);
        assert!(close(cgmath::Deg::from(camera.yaw).0, -80.0));
    }

    #[test]
    fn zoom_stays_within_bounds() {
        let mut camera = Camera::default();
        let mut controller = CameraController::default();
        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, 100.0));
        controller.update(&mut camera, Duration::ZERO);
        assert_eq!(camera.zoom, cgmath::Deg(MIN_ZOOM));

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -3.0));
        controller.update(&mut camera, Duration::ZERO);
        assert_eq!(camera.zoom, cgmath::Deg(4.0));

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -100.0));
        controller.update(&mut camera, Duration::ZERO);
        assert_eq!(camera.zoom, cgmath::Deg(MAX_ZOOM));
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let projection = Projection::new(800, 600, ZNEAR, ZFAR);
        let clip = projection.calc_matrix(ZOOM) * cgmath::Vector4::new(0.0, 0.0, -ZNEAR, 1.0);
        assert!(close(clip.z / clip.w, 0.0));
        assert!(close(projection.aspect(), 800.0 / 600.0));
    }
}
