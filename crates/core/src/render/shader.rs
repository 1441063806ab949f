//! Shader program pipeline: compile, link, validate, activate.
//!
//! Compile and link failures are blocking and surface as `ShaderError`.
//! Validation is diagnostic only: a failed validation is logged and
//! recorded in the program's [`Validation`] report, but the program is
//! still returned. Stage objects are deleted once linking has been
//! attempted, whether or not it succeeded.

use thiserror::Error;

use super::device::{GlDevice, ShaderStage};

/// Errors that can occur while building a shader program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaderError {
    /// The device refused to allocate a shader or program object.
    #[error("could not create {object} object: {reason}")]
    CreateFailed {
        /// "vertex shader", "fragment shader", or "program".
        object: String,
        /// The driver's message.
        reason: String,
    },
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError {
        stage: ShaderStage,
        /// The driver's info log, prefixed by the line-numbered source.
        log: String,
    },
    /// The program failed to link.
    #[error("shader link error:\n{0}")]
    LinkError(String),
}

/// Outcome of the non-blocking validation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { log: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

/// Formats a shader compilation error for human-readable debugging.
///
/// Prepends right-aligned line numbers to each line of `source`, then
/// appends the driver's error `log`, so line references in the log can be
/// matched against the GLSL.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let source_lines: Vec<&str> = source.lines().collect();
    let width = source_lines.len().max(1).to_string().len();

    let numbered: String = source_lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1, width = width))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => String::new(),
        (true, false) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

/// Compiles a single shader stage.
///
/// On failure the shader object is deleted and the driver log is
/// returned in `ShaderError::CompileError`. The log is never empty.
///
/// # Errors
///
/// Returns `ShaderError::CreateFailed` if the device cannot allocate a
/// shader object, or `ShaderError::CompileError` if the source is rejected.
pub fn compile_shader<D: GlDevice>(
    device: &D,
    stage: ShaderStage,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let shader = device
        .create_shader(stage)
        .map_err(|reason| ShaderError::CreateFailed {
            object: format!("{stage} shader"),
            reason,
        })?;

    if device.compile_shader(shader, source) {
        log::debug!("compiled {stage} shader");
        return Ok(shader);
    }

    let info_log = device.shader_info_log(shader);
    device.delete_shader(shader);

    let mut log = format_shader_error(source, &info_log);
    if log.is_empty() {
        log = "compilation failed with no diagnostic from the driver".to_string();
    }
    Err(ShaderError::CompileError { stage, log })
}

/// Links a vertex and fragment shader into a program.
///
/// Both shaders are detached after linking; the caller still owns them.
/// On failure the program object is deleted.
///
/// # Errors
///
/// Returns `ShaderError::CreateFailed` if the device cannot allocate a
/// program object, or `ShaderError::LinkError` if linking fails.
pub fn link_program<D: GlDevice>(
    device: &D,
    vertex: D::Shader,
    fragment: D::Shader,
) -> Result<D::Program, ShaderError> {
    let program = device
        .create_program()
        .map_err(|reason| ShaderError::CreateFailed {
            object: "program".to_string(),
            reason,
        })?;

    device.attach_shader(program, vertex);
    device.attach_shader(program, fragment);
    let linked = device.link_program(program);
    device.detach_shader(program, vertex);
    device.detach_shader(program, fragment);

    if linked {
        log::debug!("linked program {program:?}");
        Ok(program)
    } else {
        let info_log = device.program_info_log(program);
        device.delete_program(program);
        Err(ShaderError::LinkError(info_log))
    }
}

/// Validates a linked program against the current device state.
///
/// Never fails: an invalid program is logged at `warn` and reported as
/// `Validation::Invalid`.
pub fn validate_program<D: GlDevice>(device: &D, program: D::Program) -> Validation {
    let valid = device.validate_program(program);
    let log = device.program_info_log(program);

    if valid {
        log::debug!("program {program:?} validated: {log}");
        Validation::Valid
    } else {
        log::warn!("program {program:?} failed validation: {log}");
        Validation::Invalid { log }
    }
}

/// Compiles both stages, links them, and validates the result.
///
/// Stage objects are deleted before returning in every path.
///
/// # Errors
///
/// Returns the first blocking failure: `CreateFailed`, `CompileError`
/// (vertex stage first), or `LinkError`.
pub fn build_program<D: GlDevice>(
    device: &D,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<ShaderProgram<D>, ShaderError> {
    let vertex = compile_shader(device, ShaderStage::Vertex, vertex_src)?;
    let fragment = match compile_shader(device, ShaderStage::Fragment, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            device.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = link_program(device, vertex, fragment);

    // The linked program keeps its own copy of the stages.
    device.delete_shader(vertex);
    device.delete_shader(fragment);

    let program = linked?;
    let validation = validate_program(device, program);

    Ok(ShaderProgram {
        program,
        validation,
    })
}

/// A linked shader program, ready to be made current.
///
/// Immutable once built. GPU memory is released only through
/// [`ShaderProgram::destroy`] or by destroying the owning context.
pub struct ShaderProgram<D: GlDevice> {
    program: D::Program,
    validation: Validation,
}

impl<D: GlDevice> ShaderProgram<D> {
    /// Builds a program from vertex and fragment source. See [`build_program`].
    pub fn new(device: &D, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        build_program(device, vertex_src, fragment_src)
    }

    /// Makes this program the device's current program.
    pub fn use_program(&self, device: &D) {
        device.use_program(Some(self.program));
    }

    pub fn handle(&self) -> D::Program {
        self.program
    }

    /// The validation report recorded at build time.
    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Location of a vertex attribute, or `None` if the program has no
    /// active attribute with that name.
    pub fn attribute_location(&self, device: &D, name: &str) -> Option<u32> {
        device.attribute_location(self.program, name)
    }

    /// Location of a uniform, or `None` if it is inactive or undeclared.
    pub fn uniform_location(&self, device: &D, name: &str) -> Option<D::UniformLocation> {
        device.uniform_location(self.program, name)
    }

    /// Deletes the program object.
    pub fn destroy(self, device: &D) {
        device.delete_program(self.program);
    }
}

impl<D: GlDevice> std::fmt::Debug for ShaderProgram<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("validation", &self.validation)
            .finish()
    }
}

/// Build state of a program slot owned by a renderer.
///
/// Distinguishes a program that has not been built yet from one whose
/// build failed, so callers never mistake a failure for a usable handle.
pub enum ProgramState<D: GlDevice> {
    NotBuilt,
    Failed(ShaderError),
    Ready(ShaderProgram<D>),
}

impl<D: GlDevice> ProgramState<D> {
    /// Builds a program and records the outcome.
    pub fn build(device: &D, vertex_src: &str, fragment_src: &str) -> Self {
        build_program(device, vertex_src, fragment_src).into()
    }

    /// Builds a program into this slot, deleting any previously ready program first.
    pub fn rebuild(&mut self, device: &D, vertex_src: &str, fragment_src: &str) {
        if let ProgramState::Ready(old) = std::mem::replace(self, ProgramState::NotBuilt) {
            old.destroy(device);
        }
        *self = Self::build(device, vertex_src, fragment_src);
    }

    pub fn program(&self) -> Option<&ShaderProgram<D>> {
        match self {
            ProgramState::Ready(p) => Some(p),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ShaderError> {
        match self {
            ProgramState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ProgramState::Ready(_))
    }

    /// Makes the program current if it is ready. Returns whether it was.
    pub fn use_program(&self, device: &D) -> bool {
        match self {
            ProgramState::Ready(p) => {
                p.use_program(device);
                true
            }
            _ => false,
        }
    }
}

impl<D: GlDevice> Default for ProgramState<D> {
    fn default() -> Self {
        ProgramState::NotBuilt
    }
}

impl<D: GlDevice> From<Result<ShaderProgram<D>, ShaderError>> for ProgramState<D> {
    fn from(result: Result<ShaderProgram<D>, ShaderError>) -> Self {
        match result {
            Ok(p) => ProgramState::Ready(p),
            Err(e) => ProgramState::Failed(e),
        }
    }
}
