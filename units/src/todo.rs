/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These appear in the inner loops of the projectors (ray tracing, scatter
/// and gather of matrix rows), where values are extracted from their `uom`
/// wrappers once, up front, and plain `f32`s are used thereafter. The aliases
/// still give a clue in the source as to what the numbers represent.

pub type Lengthf32    = f32;
pub type Weightf32    = f32; // TODO uom Weight, once the weights gain a detection-probability normalization
pub type Ratiof32     = f32;
pub type Intensityf32 = f32;
