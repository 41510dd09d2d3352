pub mod skill_canvas;
