use cgmath::{Vector2, Zero};
use winit::{
  event::{ElementState, KeyEvent, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Orthographic view looking down the z axis at the orbital plane.
pub struct Camera {
  pub center: Vector2<f32>,
  /// Half the visible height in world units.
  pub half_height: f32,
  pub aspect: f32,
}

impl Camera {
  #[must_use]
  pub fn new(aspect: f32) -> Self {
    Self {
      center: Vector2::zero(),
      half_height: 1.0,
      aspect,
    }
  }

  #[must_use]
  pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let half_width = self.half_height * self.aspect;
    let proj = cgmath::ortho(
      self.center.x - half_width,
      self.center.x + half_width,
      self.center.y - self.half_height,
      self.center.y + self.half_height,
      -10.0,
      10.0,
    );
    OPENGL_TO_WGPU_MATRIX * proj
  }
}

pub struct CameraController {
  speed: f32,
  zoom_speed: f32,
  is_up_pressed: bool,
  is_down_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_zoom_in_pressed: bool,
  is_zoom_out_pressed: bool,
}

impl CameraController {
  #[must_use]
  pub fn init(speed: f32, zoom_speed: f32) -> Self {
    Self {
      speed,
      zoom_speed,
      is_up_pressed: false,
      is_down_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_zoom_in_pressed: false,
      is_zoom_out_pressed: false,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => self.process_key(*keycode, *state == ElementState::Pressed),
      _ => false,
    }
  }

  pub fn process_key(&mut self, keycode: KeyCode, is_pressed: bool) -> bool {
    match keycode {
      KeyCode::KeyW | KeyCode::ArrowUp => {
        self.is_up_pressed = is_pressed;
        true
      }
      KeyCode::KeyA | KeyCode::ArrowLeft => {
        self.is_left_pressed = is_pressed;
        true
      }
      KeyCode::KeyS | KeyCode::ArrowDown => {
        self.is_down_pressed = is_pressed;
        true
      }
      KeyCode::KeyD | KeyCode::ArrowRight => {
        self.is_right_pressed = is_pressed;
        true
      }
      KeyCode::KeyQ => {
        self.is_zoom_in_pressed = is_pressed;
        true
      }
      KeyCode::KeyE => {
        self.is_zoom_out_pressed = is_pressed;
        true
      }
      _ => false,
    }
  }

  pub fn update_camera(&self, camera: &mut Camera) {
    // pan speed scales with zoom so it feels the same at every level
    let step = self.speed * camera.half_height;
    if self.is_up_pressed {
      camera.center.y += step;
    }
    if self.is_down_pressed {
      camera.center.y -= step;
    }
    if self.is_right_pressed {
      camera.center.x += step;
    }
    if self.is_left_pressed {
      camera.center.x -= step;
    }
    if self.is_zoom_in_pressed {
      camera.half_height /= 1.0 + self.zoom_speed;
    }
    if self.is_zoom_out_pressed {
      camera.half_height *= 1.0 + self.zoom_speed;
    }
  }
}
