/*
 *  plugin/plugins/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Built-in plugin types
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

mod date_time;
mod icon_text;
mod icon_text_lamp;
mod just_text;
mod sys_msg;
mod text_route;

pub use date_time::DateTimePlugin;
pub use icon_text::IconTextPlugin;
pub use icon_text_lamp::IconTextLampPlugin;
pub use just_text::JustTextPlugin;
pub use sys_msg::SysMsgPlugin;
