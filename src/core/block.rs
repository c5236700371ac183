//! Block kinds and their configuration records
//!
//! A block is a rectangle on the drawing surface tagged with one of six kinds.
//! The kind fixes everything else about it: which sides it can be wired on,
//! the object prefix and constructor it is declared with, and the ordered
//! fields of its configuration record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::parameter::{ConfigError, ConfigRecord, FieldKind, FieldSpec, FieldValue};
use super::BlockId;
use crate::geometry::Rect;

/// Block kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Reads a stimulus file and drives it out
    Input,
    /// Periodic clock source
    Clock,
    /// Moore state machine
    Moore,
    /// Mealy state machine
    Mealy,
    /// Stateless function of its inputs
    Combinational,
    /// Sink that records what it receives
    Output,
}

/// Which sides of a block may carry a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub supports_output: bool,
    pub supports_input: bool,
}

impl BlockKind {
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Input,
        BlockKind::Clock,
        BlockKind::Moore,
        BlockKind::Mealy,
        BlockKind::Combinational,
        BlockKind::Output,
    ];

    pub fn capability(&self) -> Capability {
        let (supports_output, supports_input) = match self {
            BlockKind::Input | BlockKind::Clock => (true, false),
            BlockKind::Output => (false, true),
            BlockKind::Moore | BlockKind::Mealy | BlockKind::Combinational => (true, true),
        };
        Capability {
            supports_output,
            supports_input,
        }
    }

    /// Object name prefix in the generated program
    pub fn prefix(&self) -> &'static str {
        match self {
            BlockKind::Input => "input",
            BlockKind::Clock => "clock",
            BlockKind::Moore => "moore",
            BlockKind::Mealy => "mealy",
            BlockKind::Combinational => "comb",
            BlockKind::Output => "output",
        }
    }

    /// Simulator constructor the block is declared with
    pub fn constructor(&self) -> &'static str {
        match self {
            BlockKind::Input => "pysim.source",
            BlockKind::Clock => "pysim.clock",
            BlockKind::Moore => "pysim.moore",
            BlockKind::Mealy => "pysim.mealy",
            BlockKind::Combinational => "pysim.combinational",
            BlockKind::Output => "pysim.output",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BlockKind::Input => "Input Block",
            BlockKind::Clock => "Clock",
            BlockKind::Moore => "Moore",
            BlockKind::Mealy => "Mealy",
            BlockKind::Combinational => "Combinational Block",
            BlockKind::Output => "Output Block",
        }
    }

    /// Moore and Mealy machines accept a dedicated clock connection
    pub fn is_state_machine(&self) -> bool {
        matches!(self, BlockKind::Moore | BlockKind::Mealy)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            BlockKind::Input => InputConfig::FIELDS,
            BlockKind::Clock => ClockConfig::FIELDS,
            BlockKind::Moore | BlockKind::Mealy => MachineConfig::FIELDS,
            BlockKind::Combinational => CombinationalConfig::FIELDS,
            BlockKind::Output => OutputConfig::FIELDS,
        }
    }

    pub fn default_config(&self) -> BlockConfig {
        match self {
            BlockKind::Input => BlockConfig::Input(InputConfig::default()),
            BlockKind::Clock => BlockConfig::Clock(ClockConfig::default()),
            BlockKind::Moore => BlockConfig::Moore(MachineConfig::moore()),
            BlockKind::Mealy => BlockConfig::Mealy(MachineConfig::mealy()),
            BlockKind::Combinational => BlockConfig::Combinational(CombinationalConfig::default()),
            BlockKind::Output => BlockConfig::Output(OutputConfig::default()),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BlockKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" | "source" => Ok(BlockKind::Input),
            "clock" => Ok(BlockKind::Clock),
            "moore" => Ok(BlockKind::Moore),
            "mealy" => Ok(BlockKind::Mealy),
            "comb" | "combinational" => Ok(BlockKind::Combinational),
            "output" => Ok(BlockKind::Output),
            _ => Err(ConfigError::UnknownKind(s.to_string())),
        }
    }
}

/// Input block configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub file_path: String,
    pub plot: bool,
    pub block_id: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_path: "filePath".to_string(),
            plot: false,
            block_id: "Input Block".to_string(),
        }
    }
}

impl ConfigRecord for InputConfig {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("filePath", FieldKind::FilePath),
        FieldSpec::new("plot", FieldKind::Flag),
        FieldSpec::new("blockID", FieldKind::Text),
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::FilePath(self.file_path.clone()),
            FieldValue::Flag(self.plot),
            FieldValue::Text(self.block_id.clone()),
        ]
    }

    fn store(&mut self, index: usize, value: FieldValue) {
        match (index, value) {
            (0, FieldValue::FilePath(v)) => self.file_path = v,
            (1, FieldValue::Flag(v)) => self.plot = v,
            (2, FieldValue::Text(v)) => self.block_id = v,
            _ => {}
        }
    }
}

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub plot: bool,
    pub block_id: String,
    pub time_period: f64,
    pub on_time: f64,
    /// Level before the first edge (0 or 1)
    pub initial_value: i64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            plot: false,
            block_id: "Clock".to_string(),
            time_period: 1.2,
            on_time: 0.6,
            initial_value: 0,
        }
    }
}

impl ConfigRecord for ClockConfig {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("plot", FieldKind::Flag),
        FieldSpec::new("blockID", FieldKind::Text),
        FieldSpec::new("timePeriod", FieldKind::Float),
        FieldSpec::new("onTime", FieldKind::Float),
        FieldSpec::integer("initialValue", 0, Some(1)),
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Flag(self.plot),
            FieldValue::Text(self.block_id.clone()),
            FieldValue::Float(self.time_period),
            FieldValue::Float(self.on_time),
            FieldValue::Integer(self.initial_value),
        ]
    }

    fn store(&mut self, index: usize, value: FieldValue) {
        match (index, value) {
            (0, FieldValue::Flag(v)) => self.plot = v,
            (1, FieldValue::Text(v)) => self.block_id = v,
            (2, FieldValue::Float(v)) => self.time_period = v,
            (3, FieldValue::Float(v)) => self.on_time = v,
            (4, FieldValue::Integer(v)) => self.initial_value = v,
            _ => {}
        }
    }
}

/// State machine configuration, shared by Moore and Mealy blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub max_out_size: i64,
    pub plot: bool,
    pub block_id: String,
    /// Next state logic
    pub nsl: String,
    /// Output logic
    pub ol: String,
    pub starting_state: i64,
    pub rising_edge: bool,
    pub nsl_delay: f64,
    pub ol_delay: f64,
    pub register_delay: f64,
}

impl MachineConfig {
    pub fn moore() -> Self {
        Self::with_label("Moore Machine")
    }

    pub fn mealy() -> Self {
        Self::with_label("Mealy Machine")
    }

    fn with_label(label: &str) -> Self {
        Self {
            max_out_size: 1,
            plot: false,
            block_id: label.to_string(),
            nsl: "lambda ps, i: 0".to_string(),
            ol: "lambda ps, i: 0".to_string(),
            starting_state: 0,
            rising_edge: true,
            nsl_delay: 0.01,
            ol_delay: 0.01,
            register_delay: 0.01,
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::moore()
    }
}

impl ConfigRecord for MachineConfig {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::integer("maxOutSize", 0, None),
        FieldSpec::new("plot", FieldKind::Flag),
        FieldSpec::new("blockID", FieldKind::Text),
        FieldSpec::new("nsl", FieldKind::Expression),
        FieldSpec::new("ol", FieldKind::Expression),
        FieldSpec::integer("startingState", 0, None),
        FieldSpec::new("risingEdge", FieldKind::Flag),
        FieldSpec::new("nsl_delay", FieldKind::Float),
        FieldSpec::new("ol_delay", FieldKind::Float),
        FieldSpec::new("register_delay", FieldKind::Float),
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Integer(self.max_out_size),
            FieldValue::Flag(self.plot),
            FieldValue::Text(self.block_id.clone()),
            FieldValue::Expression(self.nsl.clone()),
            FieldValue::Expression(self.ol.clone()),
            FieldValue::Integer(self.starting_state),
            FieldValue::Flag(self.rising_edge),
            FieldValue::Float(self.nsl_delay),
            FieldValue::Float(self.ol_delay),
            FieldValue::Float(self.register_delay),
        ]
    }

    fn store(&mut self, index: usize, value: FieldValue) {
        match (index, value) {
            (0, FieldValue::Integer(v)) => self.max_out_size = v,
            (1, FieldValue::Flag(v)) => self.plot = v,
            (2, FieldValue::Text(v)) => self.block_id = v,
            (3, FieldValue::Expression(v)) => self.nsl = v,
            (4, FieldValue::Expression(v)) => self.ol = v,
            (5, FieldValue::Integer(v)) => self.starting_state = v,
            (6, FieldValue::Flag(v)) => self.rising_edge = v,
            (7, FieldValue::Float(v)) => self.nsl_delay = v,
            (8, FieldValue::Float(v)) => self.ol_delay = v,
            (9, FieldValue::Float(v)) => self.register_delay = v,
            _ => {}
        }
    }
}

/// Combinational block configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinationalConfig {
    pub max_out_size: i64,
    pub plot: bool,
    pub block_id: String,
    pub func: String,
    pub delay: i64,
    pub initial_value: i64,
}

impl Default for CombinationalConfig {
    fn default() -> Self {
        Self {
            max_out_size: 1,
            plot: false,
            block_id: "Combinational Block".to_string(),
            func: "lambda x: x".to_string(),
            delay: 0,
            initial_value: 0,
        }
    }
}

impl ConfigRecord for CombinationalConfig {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::integer("maxOutSize", 0, None),
        FieldSpec::new("plot", FieldKind::Flag),
        FieldSpec::new("blockID", FieldKind::Text),
        FieldSpec::new("func", FieldKind::Expression),
        FieldSpec::integer("delay", 0, None),
        FieldSpec::integer("initialValue", 0, None),
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Integer(self.max_out_size),
            FieldValue::Flag(self.plot),
            FieldValue::Text(self.block_id.clone()),
            FieldValue::Expression(self.func.clone()),
            FieldValue::Integer(self.delay),
            FieldValue::Integer(self.initial_value),
        ]
    }

    fn store(&mut self, index: usize, value: FieldValue) {
        match (index, value) {
            (0, FieldValue::Integer(v)) => self.max_out_size = v,
            (1, FieldValue::Flag(v)) => self.plot = v,
            (2, FieldValue::Text(v)) => self.block_id = v,
            (3, FieldValue::Expression(v)) => self.func = v,
            (4, FieldValue::Integer(v)) => self.delay = v,
            (5, FieldValue::Integer(v)) => self.initial_value = v,
            _ => {}
        }
    }
}

/// Output block configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub plot: bool,
    pub block_id: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot: false,
            block_id: "Output Block".to_string(),
        }
    }
}

impl ConfigRecord for OutputConfig {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("plot", FieldKind::Flag),
        FieldSpec::new("blockID", FieldKind::Text),
    ];

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Flag(self.plot),
            FieldValue::Text(self.block_id.clone()),
        ]
    }

    fn store(&mut self, index: usize, value: FieldValue) {
        match (index, value) {
            (0, FieldValue::Flag(v)) => self.plot = v,
            (1, FieldValue::Text(v)) => self.block_id = v,
            _ => {}
        }
    }
}

/// Configuration record tagged by block kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields")]
pub enum BlockConfig {
    Input(InputConfig),
    Clock(ClockConfig),
    Moore(MachineConfig),
    Mealy(MachineConfig),
    Combinational(CombinationalConfig),
    Output(OutputConfig),
}

impl BlockConfig {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockConfig::Input(_) => BlockKind::Input,
            BlockConfig::Clock(_) => BlockKind::Clock,
            BlockConfig::Moore(_) => BlockKind::Moore,
            BlockConfig::Mealy(_) => BlockKind::Mealy,
            BlockConfig::Combinational(_) => BlockKind::Combinational,
            BlockConfig::Output(_) => BlockKind::Output,
        }
    }

    /// Field names paired with their current values, in declared order
    pub fn entries(&self) -> Vec<(&'static str, FieldValue)> {
        let values = match self {
            BlockConfig::Input(c) => c.values(),
            BlockConfig::Clock(c) => c.values(),
            BlockConfig::Moore(c) | BlockConfig::Mealy(c) => c.values(),
            BlockConfig::Combinational(c) => c.values(),
            BlockConfig::Output(c) => c.values(),
        };
        self.kind()
            .fields()
            .iter()
            .map(|field| field.name)
            .zip(values)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        match self {
            BlockConfig::Input(c) => c.get(name),
            BlockConfig::Clock(c) => c.get(name),
            BlockConfig::Moore(c) | BlockConfig::Mealy(c) => c.get(name),
            BlockConfig::Combinational(c) => c.get(name),
            BlockConfig::Output(c) => c.get(name),
        }
    }

    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), ConfigError> {
        match self {
            BlockConfig::Input(c) => c.set(name, value),
            BlockConfig::Clock(c) => c.set(name, value),
            BlockConfig::Moore(c) | BlockConfig::Mealy(c) => c.set(name, value),
            BlockConfig::Combinational(c) => c.set(name, value),
            BlockConfig::Output(c) => c.set(name, value),
        }
    }

    /// Check every stored value against the kind's field declarations.
    ///
    /// Records built through [`BlockConfig::set`] always pass; this catches
    /// records deserialized from a snapshot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, (_, value)) in self.kind().fields().iter().zip(self.entries()) {
            field.check(value)?;
        }
        Ok(())
    }

    /// User-facing label (the `blockID` field)
    pub fn label(&self) -> &str {
        match self {
            BlockConfig::Input(c) => &c.block_id,
            BlockConfig::Clock(c) => &c.block_id,
            BlockConfig::Moore(c) | BlockConfig::Mealy(c) => &c.block_id,
            BlockConfig::Combinational(c) => &c.block_id,
            BlockConfig::Output(c) => &c.block_id,
        }
    }
}

/// A placed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub rect: Rect,
    pub config: BlockConfig,
}

impl Block {
    /// Create a block of `kind` with its default configuration
    pub fn new(id: BlockId, kind: BlockKind, rect: Rect) -> Self {
        Self {
            id,
            rect,
            config: kind.default_config(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.config.kind()
    }

    pub fn capability(&self) -> Capability {
        self.kind().capability()
    }

    /// Name the block is bound to in the generated program, e.g. `moore2`
    pub fn object_name(&self) -> String {
        format!("{}{}", self.kind().prefix(), self.id)
    }

    pub fn label(&self) -> &str {
        self.config.label()
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.config.get(name)
    }

    /// Set a configuration field by name
    ///
    /// # Errors
    /// `UnknownField`, `KindMismatch` or `OutOfRange`. The configuration is
    /// unchanged on error.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ConfigError> {
        self.config.set(name, value.into())
    }

    /// Set a field from text typed into a property editor
    pub fn set_field_text(&mut self, name: &str, text: &str) -> Result<(), ConfigError> {
        let fields = self.kind().fields();
        let index = super::parameter::field_index(fields, name)?;
        let value = fields[index].parse(text)?;
        self.config.set(name, value)
    }
}
